//! Form field definitions and the column layout the trained model expects.

use serde::Serialize;

use crate::types::{FieldKind, FormFields};

/// One form field and the model column it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub page: Page,
    pub label: &'static str,
}

/// The three steps of the form, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Basics,
    Condition,
    Location,
}

/// Every field, grouped by page in form order.
pub static FIELDS: [FieldSpec; 13] = [
    FieldSpec {
        key: "bedrooms",
        column: "No of Bedrooms",
        kind: FieldKind::Float,
        page: Page::Basics,
        label: "Bedrooms",
    },
    FieldSpec {
        key: "bathrooms",
        column: "No of Bathrooms",
        kind: FieldKind::Float,
        page: Page::Basics,
        label: "Bathrooms",
    },
    FieldSpec {
        key: "floors",
        column: "No of Floors",
        kind: FieldKind::Float,
        page: Page::Basics,
        label: "Floors",
    },
    FieldSpec {
        key: "waterfront",
        column: "Waterfront View",
        kind: FieldKind::Category,
        page: Page::Condition,
        label: "Waterfront view",
    },
    FieldSpec {
        key: "condition",
        column: "Condition of the House",
        kind: FieldKind::Category,
        page: Page::Condition,
        label: "Condition of the house",
    },
    FieldSpec {
        key: "grade",
        column: "Overall Grade",
        kind: FieldKind::Int,
        page: Page::Condition,
        label: "Overall grade",
    },
    FieldSpec {
        key: "age",
        column: "Age of House (in Years)",
        kind: FieldKind::Int,
        page: Page::Condition,
        label: "Age of house (years)",
    },
    FieldSpec {
        key: "area_from_basement",
        column: "Area of the House from Basement (in Sqft)",
        kind: FieldKind::Float,
        page: Page::Location,
        label: "Area of the house from basement (sqft)",
    },
    FieldSpec {
        key: "basement_area",
        column: "Basement Area (in Sqft)",
        kind: FieldKind::Float,
        page: Page::Location,
        label: "Basement area (sqft)",
    },
    FieldSpec {
        key: "latitude",
        column: "Latitude",
        kind: FieldKind::Float,
        page: Page::Location,
        label: "Latitude",
    },
    FieldSpec {
        key: "longitude",
        column: "Longitude",
        kind: FieldKind::Float,
        page: Page::Location,
        label: "Longitude",
    },
    FieldSpec {
        key: "living_area_renov",
        column: "Living Area after Renovation (in Sqft)",
        kind: FieldKind::Float,
        page: Page::Location,
        label: "Living area after renovation (sqft)",
    },
    FieldSpec {
        key: "lot_area",
        column: "Lot Area after Renovation (in Sqft)",
        kind: FieldKind::Float,
        page: Page::Location,
        label: "Lot area after renovation (sqft)",
    },
];

/// Column order of the trained model's input frame.
///
/// Names, order and count are pinned to the artifact. A reordering does not
/// fail; it silently feeds values into the wrong columns.
pub const MODEL_COLUMNS: [&str; 13] = [
    "No of Bedrooms",
    "No of Bathrooms",
    "No of Floors",
    "Waterfront View",
    "Condition of the House",
    "Overall Grade",
    "Basement Area (in Sqft)",
    "Age of House (in Years)",
    "Latitude",
    "Longitude",
    "Living Area after Renovation (in Sqft)",
    "Lot Area after Renovation (in Sqft)",
    "Area of the House from Basement (in Sqft)",
];

/// Choices offered for the categorical fields.
pub const WATERFRONT_CHOICES: [&str; 2] = ["No", "Yes"];
pub const CONDITION_CHOICES: [&str; 5] = ["Bad", "Okay", "Fair", "Good", "Excellent"];

impl FieldSpec {
    /// Allowed values for a categorical field offered as a fixed list.
    pub fn choices(&self) -> Option<&'static [&'static str]> {
        match self.key {
            "waterfront" => Some(&WATERFRONT_CHOICES),
            "condition" => Some(&CONDITION_CHOICES),
            _ => None,
        }
    }
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Basics, Page::Condition, Page::Location];

    /// Fields collected on this page.
    pub fn fields(self) -> impl Iterator<Item = &'static FieldSpec> {
        FIELDS.iter().filter(move |f| f.page == self)
    }

    /// Fields that must be present when this page's form is submitted:
    /// its own fields plus everything carried from earlier pages.
    pub fn required_on_submit(self) -> impl Iterator<Item = &'static FieldSpec> {
        FIELDS.iter().filter(move |f| f.page <= self)
    }

    /// Fields collected before this page is shown.
    pub fn carried(self) -> impl Iterator<Item = &'static FieldSpec> {
        FIELDS.iter().filter(move |f| f.page < self)
    }

    pub fn next(self) -> Option<Page> {
        match self {
            Page::Basics => Some(Page::Condition),
            Page::Condition => Some(Page::Location),
            Page::Location => None,
        }
    }

    /// 1-based position in the form.
    pub fn number(self) -> usize {
        match self {
            Page::Basics => 1,
            Page::Condition => 2,
            Page::Location => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Basics => "Basic information",
            Page::Condition => "Condition and view",
            Page::Location => "Area and location",
        }
    }
}

pub fn field_by_key(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

pub fn field_by_column(column: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.column == column)
}

/// The form layout and model column order as JSON.
pub fn describe() -> serde_json::Value {
    let pages: Vec<serde_json::Value> = Page::ALL
        .iter()
        .map(|page| {
            serde_json::json!({
                "page": page.number(),
                "title": page.title(),
                "fields": page.fields().map(|f| f.key).collect::<Vec<_>>(),
            })
        })
        .collect();

    serde_json::json!({
        "model_columns": MODEL_COLUMNS,
        "fields": FIELDS,
        "pages": pages,
    })
}

/// Reference inputs for probes and walkthroughs.
pub fn example_form() -> FormFields {
    [
        ("bedrooms", "3"),
        ("bathrooms", "2"),
        ("floors", "1"),
        ("waterfront", "Yes"),
        ("condition", "Good"),
        ("grade", "7"),
        ("age", "15"),
        ("area_from_basement", "1200"),
        ("basement_area", "400"),
        ("latitude", "47.5"),
        ("longitude", "-122.2"),
        ("living_area_renov", "2000"),
        ("lot_area", "5000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
