mod config;
mod error;
mod render;
mod store;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vitrine_catalog::{
    CatalogProjector, CategoryFilter, Item, ItemDraft, ItemId, LiveCatalogFeed, Price, search,
};

use crate::config::load_config;
use crate::store::AppContext;

const DEFAULT_LOG: &str = "warn";

#[derive(Parser)]
#[command(name = "vit")]
#[command(about = "Vitrine catalog maintenance", long_about = None)]
struct Cli {
    /// Path to the catalog store
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log filter (falls back to VIT_LOG, then "warn")
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an item
    Add {
        #[command(flatten)]
        item: ItemArgs,
    },
    /// Replace an item's fields; omitted fields keep their value
    Edit {
        id: String,
        #[command(flatten)]
        item: ItemArgs,
    },
    /// Delete an item
    Rm { id: String },
    /// Show one item
    Show { id: String },
    /// List items, one page at a time
    List {
        /// Category to filter on, or "all"
        #[arg(short, long, default_value = "all")]
        category: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Only items whose name or category contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Follow the catalog as it changes
    Watch {
        /// Category to filter on, or "all"
        #[arg(short, long, default_value = "all")]
        category: String,
    },
}

#[derive(Args, Debug, Default)]
struct ItemArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Price as digits ("12990") or formatted ("R$ 129,90")
    #[arg(long)]
    price: Option<String>,

    /// Category label; repeat for several
    #[arg(short = 'c', long = "category")]
    categories: Vec<String>,

    /// Put the item on promotion, giving the price before the discount
    #[arg(long, value_name = "ORIGINAL_PRICE")]
    promotion: Option<String>,

    /// Label shown on the promotion
    #[arg(long, requires = "promotion")]
    tag: Option<String>,

    /// Take the item off promotion
    #[arg(long, conflicts_with = "promotion")]
    no_promotion: bool,

    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

/// Formats typed digits like the admin form does; anything without digits
/// is passed through for the validation gate to judge.
fn price_input(input: &str) -> String {
    Price::from_digits(input)
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}

impl ItemArgs {
    fn apply(&self, mut draft: ItemDraft) -> ItemDraft {
        if let Some(name) = &self.name {
            draft.name = name.clone();
        }
        if let Some(description) = &self.description {
            draft.description = description.clone();
        }
        if let Some(price) = &self.price {
            draft.price = price_input(price);
        }
        if !self.categories.is_empty() {
            draft.categories = self.categories.clone();
        }
        if let Some(original_price) = &self.promotion {
            draft.is_promotion = true;
            draft.original_price = price_input(original_price);
            draft.promotion_tag = self.tag.clone().unwrap_or_default();
        }
        if self.no_promotion {
            draft.is_promotion = false;
            draft.original_price.clear();
            draft.promotion_tag.clear();
        }
        draft
    }

    async fn read_image(&self) -> anyhow::Result<Option<Vec<u8>>> {
        match &self.image {
            Some(path) => Ok(Some(tokio::fs::read(path).await?)),
            None => Ok(None),
        }
    }
}

fn init_logging(cli_filter: Option<String>) {
    let filter = cli_filter
        .or_else(|| std::env::var("VIT_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log);

    let config = load_config()?;
    let store_path = config.store_path(cli.store);
    let ctx = AppContext::open(store_path, config.catalog)?;

    match cli.command {
        Command::Add { item } => {
            let draft = item.apply(ItemDraft::default());
            let image = item.read_image().await?;
            let created = ctx.gateway.create(image, &draft).await?;
            println!("{}", created.id);
        }
        Command::Edit { id, item } => {
            let id = ItemId::new(id);
            let existing = ctx.gateway.get(&id).await?;
            let draft = item.apply(ItemDraft::from_item(&existing));
            let image = item.read_image().await?;
            let updated = ctx.gateway.update(&id, &draft, image).await?;
            println!("{}", render::item_line(&updated));
        }
        Command::Rm { id } => {
            ctx.gateway.delete(&ItemId::new(id)).await?;
        }
        Command::Show { id } => {
            let item = ctx.gateway.get(&ItemId::new(id)).await?;
            println!("{}", render::item_detail(&item));
        }
        Command::List {
            category,
            page,
            search: term,
        } => {
            let filter = CategoryFilter::parse(&category).map_err(error::VitError::from)?;
            let mut items = ctx.gateway.list().await?;
            if let Some(term) = term {
                items = search(&items, &term).into_iter().cloned().collect::<Vec<Item>>();
            }

            let mut projector = CatalogProjector::new(ctx.catalog.page_size);
            projector.select(filter);
            projector.go_to(page, &items);
            println!("{}", render::view(&projector.view(&items), filter));
        }
        Command::Watch { category } => {
            let filter = CategoryFilter::parse(&category).map_err(error::VitError::from)?;
            watch(&ctx, filter).await?;
        }
    }

    Ok(())
}

async fn watch(ctx: &AppContext, filter: CategoryFilter) -> anyhow::Result<()> {
    let mut feed = LiveCatalogFeed::open(&*ctx.store, &ctx.catalog.collection).await?;
    let mut projector = CatalogProjector::new(ctx.catalog.page_size);
    projector.select(filter);

    loop {
        let items = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            items = feed.changed() => match items {
                Some(items) => items,
                None => break,
            },
        };

        println!("{}", render::view(&projector.view(&items), filter));
        if let Some(reason) = feed.last_error() {
            eprintln!("last change stream error: {reason}");
        }
        println!();
    }

    feed.close().await;
    Ok(())
}
