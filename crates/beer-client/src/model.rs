//! Beer resource representation

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Beer styles known to the service. Serialized as the upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeerStyle {
    Lager,
    Pilsner,
    Stout,
    Gose,
    Porter,
    Ale,
    Wheat,
    Ipa,
    PaleAle,
    Saison,
}

impl BeerStyle {
    pub const ALL: [BeerStyle; 10] = [
        BeerStyle::Lager,
        BeerStyle::Pilsner,
        BeerStyle::Stout,
        BeerStyle::Gose,
        BeerStyle::Porter,
        BeerStyle::Ale,
        BeerStyle::Wheat,
        BeerStyle::Ipa,
        BeerStyle::PaleAle,
        BeerStyle::Saison,
    ];

    /// Wire and query-string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BeerStyle::Lager => "LAGER",
            BeerStyle::Pilsner => "PILSNER",
            BeerStyle::Stout => "STOUT",
            BeerStyle::Gose => "GOSE",
            BeerStyle::Porter => "PORTER",
            BeerStyle::Ale => "ALE",
            BeerStyle::Wheat => "WHEAT",
            BeerStyle::Ipa => "IPA",
            BeerStyle::PaleAle => "PALE_ALE",
            BeerStyle::Saison => "SAISON",
        }
    }
}

impl fmt::Display for BeerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeerStyle {
    type Err = Error;

    /// Case-insensitive; `-` is accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        BeerStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| Error::Validation(format!("unknown beer style: {s}")))
    }
}

/// A beer as exchanged with the service.
///
/// `id`, `version` and the timestamps are assigned by the server. They are
/// left out of the JSON when unset, so a freshly built `Beer` is a valid
/// create payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(rename = "beerName")]
    pub name: String,
    #[serde(rename = "beerStyle")]
    pub style: BeerStyle,
    pub upc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_on_hand: Option<i32>,
    pub price: Decimal,
    #[serde(rename = "createdDate", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(rename = "updateDate", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Beer {
    /// New, unsaved beer.
    pub fn new(
        name: impl Into<String>,
        style: BeerStyle,
        upc: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id: None,
            version: None,
            name: name.into(),
            style,
            upc: upc.into(),
            quantity_on_hand: None,
            price,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_quantity_on_hand(mut self, quantity: i32) -> Self {
        self.quantity_on_hand = Some(quantity);
        self
    }
}
