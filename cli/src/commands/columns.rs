use anyhow::Result;
use papermap::{read_table, resolve_columns, KEYWORDS_V1};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ColumnsArgs) -> Result<()> {
    let table = read_table(&args.table)?;
    let selection = resolve_columns(table.headers(), &KEYWORDS_V1);
    let show = |column: &Option<String>| column.as_deref().unwrap_or("<select manually>").to_string();

    println!("headers:   {}", table.headers().join(", "));
    println!("site:      {}", show(&selection.site));
    println!("latitude:  {}", show(&selection.lat));
    println!("longitude: {}", show(&selection.lon));
    println!("rows:      {}", table.len());

    Ok(())
}
