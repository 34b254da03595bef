//! Command-line arguments

use beer_client::{Beer, BeerListParams, BeerStyle};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "beer-cli", version, about = "Client for the beer service", long_about = None)]
pub struct Cli {
    /// TOML config file (falls back to CONFIG_PATH, then ./beer-client.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum Command {
    /// List one page of beers
    List(ListArgs),
    /// Fetch one beer
    Get { id: Uuid },
    /// Create a beer and print it with its assigned id
    Create(CreateArgs),
    /// Change fields of an existing beer
    Update {
        id: Uuid,
        #[command(flatten)]
        changes: BeerChanges,
    },
    /// Delete a beer
    Delete { id: Uuid },
}

#[derive(Debug, Default, PartialEq, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub style: Option<BeerStyle>,
    #[arg(long)]
    pub show_inventory: bool,
    #[arg(long = "page")]
    pub page_number: Option<u32>,
    #[arg(long = "size")]
    pub page_size: Option<u32>,
}

impl ListArgs {
    pub fn params(&self) -> BeerListParams {
        let mut params = BeerListParams::new().show_inventory(self.show_inventory);
        if let Some(name) = &self.name {
            params = params.name(name.clone());
        }
        if let Some(style) = self.style {
            params = params.style(style);
        }
        if let Some(page_number) = self.page_number {
            params = params.page_number(page_number);
        }
        if let Some(page_size) = self.page_size {
            params = params.page_size(page_size);
        }
        params
    }
}

#[derive(Debug, PartialEq, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub style: BeerStyle,
    #[arg(long)]
    pub upc: String,
    #[arg(long)]
    pub price: Decimal,
    #[arg(long = "quantity")]
    pub quantity_on_hand: Option<i32>,
}

impl CreateArgs {
    pub fn into_beer(self) -> Beer {
        let beer = Beer::new(self.name, self.style, self.upc, self.price);
        match self.quantity_on_hand {
            Some(quantity) => beer.with_quantity_on_hand(quantity),
            None => beer,
        }
    }
}

/// Fields to overwrite on an existing beer before updating it.
#[derive(Debug, Default, PartialEq, Args)]
#[group(required = true, multiple = true)]
pub struct BeerChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub style: Option<BeerStyle>,
    #[arg(long)]
    pub upc: Option<String>,
    #[arg(long)]
    pub price: Option<Decimal>,
    #[arg(long = "quantity")]
    pub quantity_on_hand: Option<i32>,
}

impl BeerChanges {
    pub fn apply(self, beer: &mut Beer) {
        if let Some(name) = self.name {
            beer.name = name;
        }
        if let Some(style) = self.style {
            beer.style = style;
        }
        if let Some(upc) = self.upc {
            beer.upc = upc;
        }
        if let Some(price) = self.price {
            beer.price = price;
        }
        if let Some(quantity) = self.quantity_on_hand {
            beer.quantity_on_hand = Some(quantity);
        }
    }
}
