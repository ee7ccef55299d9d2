use anyhow::{Context, Result};
use papermap::compose::compose;

use super::load_config;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ComposeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let out_path = args.output.clone().unwrap_or("./composite.png".into());

    let open = |path: &std::path::Path| -> Result<image::RgbaImage> {
        Ok(image::open(path).with_context(|| format!("[compose] failed to read {}", path.display()))?.to_rgba8())
    };
    let (country, state, district, study) =
        (open(&args.country)?, open(&args.state)?, open(&args.district)?, open(&args.study_area)?);

    let combined = compose([Some(&country), Some(&state), Some(&district)], Some(&study), &config.composite)?;
    combined.save(&out_path).with_context(|| format!("[compose] failed to write {}", out_path.display()))?;
    println!("[compose] wrote {} ({}x{})", out_path.display(), combined.width(), combined.height());

    Ok(())
}
