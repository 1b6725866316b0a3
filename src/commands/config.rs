//! Print the stack definition

use std::path::Path;

use compose_stack::config::TEMPLATE;
use compose_stack::Config;

pub fn config(path: Option<&Path>, template: bool) -> Result<(), Box<dyn std::error::Error>> {
    if template {
        log::info!("show a template only");
        print!("{}", TEMPLATE);
        return Ok(());
    }

    let config = Config::load(path)?;
    log::info!("show config file '{}'", config.path().display());
    print!("{}", config);
    Ok(())
}
