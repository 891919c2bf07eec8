use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Hr,
    Employee,
}

/// Things a caller may be allowed to do beyond acting on their own records.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    ManageUsers,
    ApproveLeave,
    ViewAllRecords,
    AdjustBalances,
    ManageAssets,
    ManagePolicies,
}

const HR_CAPABILITIES: &[Capability] = &[
    Capability::ManageUsers,
    Capability::ApproveLeave,
    Capability::ViewAllRecords,
    Capability::AdjustBalances,
    Capability::ManageAssets,
    Capability::ManagePolicies,
];

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Hr => HR_CAPABILITIES,
            Role::Employee => &[],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Hr => "hr",
            Role::Employee => "employee",
        }
    }
}
