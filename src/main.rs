//! # Carta CLI
//!
//! Usage:
//!   carta menu.json -o menu.pdf
//!   cat menu.json | carta --preview -o preview.json
//!   carta menu.json --plan
//!   carta --example > menu.json

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use carta::image_loader::DefaultResolver;
use carta::measure::DEFAULT_TOLERANCE;
use carta::{parse_document, CartaError, Engine, Strategy};

#[derive(Parser)]
#[command(name = "carta")]
#[command(version)]
#[command(about = "Paginate a restaurant menu and render it to PDF", long_about = None)]
struct Cli {
    /// Menu document (JSON). Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the preview scene as JSON instead of a PDF
    #[arg(long)]
    preview: bool,

    /// Print the page plan as JSON to stdout and stop
    #[arg(long)]
    plan: bool,

    /// How block heights are measured
    #[arg(long, value_enum, default_value = "render")]
    strategy: StrategyArg,

    /// Compare both measuring strategies and report divergent blocks
    #[arg(long)]
    check: bool,

    /// Print an example menu document and exit
    #[arg(long)]
    example: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Render,
    Analytic,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Render => Strategy::Render,
            StrategyArg::Analytic => Strategy::Analytic,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.example {
        print!("{}", example_menu_json());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CartaError> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let (doc, layout) = parse_document(&input)?;
    // Relative icon and logo paths are read next to the input file.
    let mut resolver = DefaultResolver::new().with_assets(doc.assets.clone());
    if let Some(dir) = cli.input.as_deref().and_then(Path::parent) {
        resolver = resolver.with_base_dir(dir);
    }
    let engine = Engine::for_document(&doc)?
        .with_assets(Box::new(resolver))
        .with_strategy(cli.strategy.into());
    let result = engine.paginate(&doc.menu, &layout);

    if cli.check {
        let divergences = engine.cross_check(&result.sequence, &layout, DEFAULT_TOLERANCE);
        eprintln!(
            "{} of {} blocks differ by more than {:.0}% between strategies",
            divergences.len(),
            result.sequence.len(),
            DEFAULT_TOLERANCE * 100.0
        );
    }

    for page in result.plan.overflow_pages() {
        eprintln!("! page {} holds a block taller than the page", page.number);
    }

    if cli.plan {
        let json = serde_json::to_string_pretty(&result.plan)?;
        println!("{}", json);
        return Ok(());
    }

    if cli.preview {
        let scene = engine.preview(&result, &layout)?;
        let json = serde_json::to_string_pretty(&scene)?;
        match &cli.output {
            Some(path) => fs::write(path, json)?,
            None => io::stdout().write_all(json.as_bytes())?,
        }
        return Ok(());
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("menu.pdf"));
    let pdf = engine.render_pdf(&result, &layout, &doc.menu)?;
    fs::write(&output, &pdf)?;
    eprintln!(
        "✓ Written {} pages ({} bytes) to {}",
        result.page_count(),
        pdf.len(),
        output.display()
    );
    Ok(())
}

fn example_menu_json() -> &'static str {
    r##"{
  "layout": {
    "margins": {
      "general": { "top": 20, "right": 20, "bottom": 20, "left": 20 },
      "distinctCover": true,
      "cover": { "top": 60, "right": 25, "bottom": 25, "left": 25 }
    },
    "categoryTitle": { "fontFamily": "Playfair Display", "fontSize": 18, "bold": true, "color": "#7a2e1d" },
    "serviceLinePlacement": { "placement": "footer", "reserveMm": 12 },
    "priceFormat": { "currencySymbol": "€", "decimals": 2, "decimalSeparator": ",", "symbolBefore": true }
  },
  "menu": {
    "language": "it",
    "title": "Trattoria da Nonna",
    "subtitle": "Cucina di casa dal 1962",
    "serviceCharge": 2.5,
    "labels": {
      "allergensPrefix": "Allergeni:",
      "serviceCharge": "Coperto",
      "allergenPageTitle": "Allergeni"
    },
    "allergens": [
      { "id": "a1", "code": "1", "name": "Glutine" },
      { "id": "a7", "code": "7", "name": "Latte" }
    ],
    "categories": [
      {
        "id": "antipasti",
        "name": "Antipasti",
        "products": [
          {
            "id": "bruschetta",
            "name": "Bruschetta al pomodoro",
            "description": "Pane casereccio tostato, pomodoro fresco, basilico e olio extravergine.",
            "descriptionSecondary": "Toasted country bread, fresh tomato, basil and extra virgin olive oil.",
            "price": 6.5,
            "allergens": [{ "id": "a1", "code": "1", "name": "Glutine" }],
            "features": [{ "id": "veg", "name": "Vegetariano" }]
          },
          {
            "id": "burrata",
            "name": "Burrata pugliese",
            "price": 12,
            "priceSuffix": "/ 250g",
            "label": { "name": "Novità", "color": "#c0392b" },
            "allergens": [{ "id": "a7", "code": "7", "name": "Latte" }]
          }
        ]
      },
      {
        "id": "primi",
        "name": "Primi",
        "products": [
          {
            "id": "carbonara",
            "name": "Spaghetti alla carbonara",
            "description": "Guanciale, pecorino romano, uovo e pepe nero.",
            "variants": [
              { "name": "Mezza porzione", "price": 8 },
              { "name": "Porzione intera", "price": 13 }
            ]
          }
        ]
      }
    ],
    "notes": [
      { "id": "n1", "categoryId": "primi", "title": "Pasta fresca", "text": "Tutta la pasta è fatta in casa ogni mattina." }
    ]
  }
}
"##
}
