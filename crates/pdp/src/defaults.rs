//! Warehouse seed policies and JSON policy sets.

use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// A loadable list of policies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl PolicySet {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn defaults() -> Self {
        Self {
            policies: default_policies(),
        }
    }
}

impl IntoIterator for PolicySet {
    type Item = Policy;
    type IntoIter = std::vec::IntoIter<Policy>;

    fn into_iter(self) -> Self::IntoIter {
        self.policies.into_iter()
    }
}

/// The policies a fresh warehouse deployment starts with.
pub fn default_policies() -> Vec<Policy> {
    const STAFF: [&str; 2] = ["USER", "ADMIN"];
    const ADMIN: [&str; 1] = ["ADMIN"];

    vec![
        Policy::permit("admin-product-full-access", "product", "any")
            .with_description("Administrators can perform all operations on products")
            .with_subjects(ADMIN),
        Policy::permit("user-product-access", "product", "create")
            .with_description("Regular users can create and read products")
            .with_subjects(STAFF),
        Policy::permit("user-product-read-access", "product", "read")
            .with_description("Regular users can read products")
            .with_subjects(STAFF),
        Policy::permit("admin-delete-products", "product", "delete")
            .with_description("Only administrators can delete products")
            .with_subjects(ADMIN),
        Policy::permit("user-product-update-access", "product", "update")
            .with_description("Regular users can update products")
            .with_subjects(STAFF),
        Policy::permit("import-slip-access", "importslip", "create")
            .with_description("Users can create import slips")
            .with_subjects(STAFF),
        Policy::permit("export-slip-access", "exportslip", "create")
            .with_description("Users can create export slips")
            .with_subjects(STAFF),
        Policy::permit("read-import-slip-access", "importslip", "read")
            .with_description("Users can read import slips")
            .with_subjects(STAFF),
        Policy::permit("read-export-slip-access", "exportslip", "read")
            .with_description("Users can read export slips")
            .with_subjects(STAFF),
        Policy::permit("export-sufficient-quantity", "exportslip", "create")
            .with_description("Users can only export products with sufficient quantity in stock")
            .with_subjects(STAFF)
            .with_conditions(["quantity>=:1"]),
        Policy::permit("product-name-pattern-policy", "product", "update")
            .with_description("Special policy for products with names matching a pattern")
            .with_subjects(ADMIN)
            .with_conditions(["regex:^special_.*$"]),
    ]
}
