use crate::context::ExecutionContext;
use anyhow::Result;
use tally_runtime::Config;

pub fn show(ctx: &ExecutionContext) -> Result<()> {
    let config = ctx.config()?;

    if ctx.is_json() {
        return super::print_json(config);
    }

    let path = ctx.config_path();
    let origin = if path.exists() { "" } else { " (not written; defaults)" };
    println!("{}", ctx.palette.dim(format!("# {}{}", path.display(), origin)));
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn init(ctx: &ExecutionContext, force: bool) -> Result<()> {
    let path = ctx.config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    Config::default().save_to(&path)?;
    if !ctx.is_json() {
        println!("Wrote {}", ctx.palette.good(path.display()));
    }
    Ok(())
}
