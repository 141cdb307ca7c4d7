//! Master-data entities: sites, machines, units, item groups, and items.
//!
//! Each entity comes with a draft type (what a form submits) whose
//! validation rules mirror the server's required fields.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Resource, not_blank};

// =============================================================================
// SITE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SiteDraft {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Short name must be 1-10 characters"))]
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Resource for Site {
    type Draft = SiteDraft;
    const COLLECTION: &'static str = "sites";
    const LABEL: &'static str = "Site";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.short_name.as_str()];
        fields.extend(self.location.as_deref());
        fields
    }
}

// =============================================================================
// MACHINE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub machine_type: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MachineDraft {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[validate(custom = "not_blank")]
    pub site: String,
}

impl Resource for Machine {
    type Draft = MachineDraft;
    const COLLECTION: &'static str = "machines";
    const LABEL: &'static str = "Machine";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.machine_type.as_str()];
        fields.extend(self.registration_number.as_deref());
        fields
    }
}

/// One scheduled maintenance entry for a machine. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMaintenance {
    pub id: String,
    pub machine: String,
    #[serde(default)]
    pub maintenance_type: String,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// UNIT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnitDraft {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Short name must be 1-10 characters"))]
    pub short_name: String,
}

impl Resource for Unit {
    type Draft = UnitDraft;
    const COLLECTION: &'static str = "units";
    const LABEL: &'static str = "Unit";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.short_name.as_str()]
    }
}

// =============================================================================
// ITEM GROUP
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemGroupDraft {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Short name must be 1-10 characters"))]
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for ItemGroup {
    type Draft = ItemGroupDraft;
    const COLLECTION: &'static str = "item-groups";
    const LABEL: &'static str = "Item group";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.short_name.as_str()]
    }
}

// =============================================================================
// ITEM
// =============================================================================

/// A spare part or consumable. `unit` and `item_group` hold parent ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub item_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[validate(custom = "not_blank")]
    pub unit: String,
    #[validate(custom = "not_blank")]
    pub item_group: String,
}

impl Resource for Item {
    type Draft = ItemDraft;
    const COLLECTION: &'static str = "items";
    const LABEL: &'static str = "Item";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.part_number.as_deref());
        fields
    }
}
