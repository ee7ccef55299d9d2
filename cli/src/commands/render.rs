use std::fs;

use anyhow::{Context, Result};
use papermap::{read_table, resolve_columns, Pipeline, KEYWORDS_V1};

use super::load_config;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RenderArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(states) = &args.states { config.boundaries.states = states.clone(); }
    if let Some(districts) = &args.districts { config.boundaries.districts = districts.clone(); }
    if let Some(basemap) = &args.basemap { config.study_area.basemap = basemap.clone(); }
    if let Some(arrow) = &args.north_arrow { config.study_area.north_arrow.path = Some(arrow.clone()); }
    if let Some(font) = &args.font { config.font = Some(font.clone()); }
    if args.no_text { config.draw_text = false; }

    let out_dir = args.output.clone().unwrap_or(".".into());
    fs::create_dir_all(&out_dir).with_context(|| format!("[render] failed to create {}", out_dir.display()))?;

    println!("[render] reading {}", args.table.display());
    let table = read_table(&args.table)?;
    let columns = resolve_columns(table.headers(), &KEYWORDS_V1)
        .with_overrides(args.columns.site.clone(), args.columns.lat.clone(), args.columns.lon.clone())
        .require()?;
    println!("[render] columns: site={:?} lat={:?} lon={:?}", columns.site, columns.lat, columns.lon);

    println!("[render] loading boundaries from {} and {}",
        config.boundaries.states.display(), config.boundaries.districts.display());
    let pipeline = Pipeline::from_config(config)?;
    let output = pipeline.run(&table, &columns)?;

    let selection = &output.selection;
    println!("[render] {} sites, detected state: {}", selection.sites.len(),
        selection.detected_state.as_deref().unwrap_or("<none>"));
    if !selection.covered_districts.is_empty() {
        let districts: Vec<&str> = selection.covered_districts.iter().map(String::as_str).collect();
        println!("[render] covered districts: {}", districts.join(", "));
    }

    for (name, view) in output.maps() {
        let path = out_dir.join(format!("{name}.png"));
        view.save(&path).with_context(|| format!("[render] failed to write {}", path.display()))?;
        println!("[render] wrote {}", path.display());
    }

    match output.compose(&pipeline.config().composite) {
        Ok(combined) => {
            let path = out_dir.join("composite.png");
            combined.save(&path).with_context(|| format!("[render] failed to write {}", path.display()))?;
            println!("[render] wrote {}", path.display());
        }
        Err(e) => println!("[render] composite skipped: {e}"),
    }

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }

    Ok(())
}
