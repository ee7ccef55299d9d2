use std::path::PathBuf;

use papermap::render::Basemap;

/// Publication map figures from a table of sites
#[derive(clap::Parser, Debug)]
#[command(name = "papermap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render the study-area map, the overviews and the composite
    Render(RenderArgs),

    /// Show which columns hold the site name, latitude and longitude
    Columns(ColumnsArgs),

    /// Stitch four existing map images into the composite layout
    Compose(ComposeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ColumnOverrides {
    /// Site name column (skips detection)
    #[arg(long = "site-col")]
    pub site: Option<String>,

    /// Latitude column (skips detection)
    #[arg(long = "lat-col")]
    pub lat: Option<String>,

    /// Longitude column (skips detection)
    #[arg(long = "lon-col")]
    pub lon: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Input table (.csv, .tsv, .txt, .xls, .xlsx, .ods)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub table: PathBuf,

    /// JSON style and data configuration
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// State boundary shapefile
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub states: Option<PathBuf>,

    /// District boundary shapefile
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub districts: Option<PathBuf>,

    #[command(flatten)]
    pub columns: ColumnOverrides,

    /// Basemap: osm, positron, esri-topo, esri-street, none or an XYZ URL template
    #[arg(long)]
    pub basemap: Option<Basemap>,

    /// North arrow PNG
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub north_arrow: Option<PathBuf>,

    /// TrueType font for labels and ticks
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub font: Option<PathBuf>,

    /// Render geometry only, without any text
    #[arg(long)]
    pub no_text: bool,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ColumnsArgs {
    /// Input table (.csv, .tsv, .txt, .xls, .xlsx, .ods)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub table: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ComposeArgs {
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub country: PathBuf,

    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub state: PathBuf,

    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub district: PathBuf,

    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub study_area: PathBuf,

    /// JSON configuration (only the `composite` section is used)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output image, defaults to "./composite.png"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
