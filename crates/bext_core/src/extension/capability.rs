//! Interface identifiers recognized by capability queries.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a typed interface (an IID on the host ABI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceId(Uuid);

/// Generic object interface (`IUnknown`).
pub const IID_OBJECT: InterfaceId =
    InterfaceId::from_u128(0x0000_0000_0000_0000_C000_0000_0000_0046);
/// Bundle extension interface (`IBundleExtension`).
pub const IID_BUNDLE_EXTENSION: InterfaceId =
    InterfaceId::from_u128(0x9312_3C9D_796B_4FCD_A507_6EDE_F9A9_25FD);

impl InterfaceId {
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Builds an id from the Windows `GUID` field split.
    pub fn from_fields(data1: u32, data2: u16, data3: u16, data4: &[u8; 8]) -> Self {
        Self(Uuid::from_fields(data1, data2, data3, data4))
    }

    /// Splits the id into Windows `GUID` fields.
    pub fn as_fields(&self) -> (u32, u16, u16, &[u8; 8]) {
        self.0.as_fields()
    }
}

impl Display for InterfaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated().encode_upper(&mut Uuid::encode_buffer()))
    }
}

impl FromStr for InterfaceId {
    type Err = uuid::Error;

    /// Accepts both braced (`{...}`) and bare hyphenated forms.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Capabilities every bundle extension object answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Object,
    BundleExtension,
}

impl Capability {
    pub fn interface_id(self) -> InterfaceId {
        match self {
            Self::Object => IID_OBJECT,
            Self::BundleExtension => IID_BUNDLE_EXTENSION,
        }
    }

    /// Resolves a requested interface id; `None` means unsupported.
    pub fn from_interface_id(iid: &InterfaceId) -> Option<Self> {
        if *iid == IID_BUNDLE_EXTENSION {
            Some(Self::BundleExtension)
        } else if *iid == IID_OBJECT {
            Some(Self::Object)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::BundleExtension => "bundle_extension",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, InterfaceId, IID_BUNDLE_EXTENSION, IID_OBJECT};

    #[test]
    fn resolves_both_supported_capabilities() {
        assert_eq!(
            Capability::from_interface_id(&IID_OBJECT),
            Some(Capability::Object)
        );
        assert_eq!(
            Capability::from_interface_id(&IID_BUNDLE_EXTENSION),
            Some(Capability::BundleExtension)
        );
        assert_eq!(Capability::Object.interface_id(), IID_OBJECT);
    }

    #[test]
    fn rejects_other_interface_ids() {
        let iid: InterfaceId = "6D4F5A3E-0000-4000-8000-000000000001"
            .parse()
            .expect("valid uuid text");
        assert_eq!(Capability::from_interface_id(&iid), None);
    }

    #[test]
    fn parses_braced_form_and_displays_upper_case() {
        let iid: InterfaceId = "{93123c9d-796b-4fcd-a507-6edef9a925fd}"
            .parse()
            .expect("braced uuid text");
        assert_eq!(iid, IID_BUNDLE_EXTENSION);
        assert_eq!(
            IID_OBJECT.to_string(),
            "{00000000-0000-0000-C000-000000000046}"
        );
    }

    #[test]
    fn guid_fields_round_trip() {
        let (data1, data2, data3, data4) = IID_BUNDLE_EXTENSION.as_fields();
        assert_eq!(data1, 0x9312_3C9D);
        assert_eq!(data2, 0x796B);
        assert_eq!(data3, 0x4FCD);
        assert_eq!(
            InterfaceId::from_fields(data1, data2, data3, data4),
            IID_BUNDLE_EXTENSION
        );
    }
}
