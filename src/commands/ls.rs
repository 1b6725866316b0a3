//! Docker images and volumes

use compose_stack::inventory::{self, IMAGE_COLUMNS, VOLUME_COLUMNS};
use compose_stack::{print_table, LogDiagnostics, SystemRunner, TableOptions};

pub fn ls() -> Result<(), Box<dyn std::error::Error>> {
    let runner = SystemRunner;
    let diag = LogDiagnostics;

    println!("# DOCKER IMAGES");
    let images = inventory::docker_images(&runner, &diag)?;
    print_table(&images, &TableOptions::with_columns(IMAGE_COLUMNS))?;

    println!();
    println!("# DOCKER VOLUMES");
    let volumes = inventory::docker_volumes(&runner, &diag)?;
    print_table(&volumes, &TableOptions::with_columns(VOLUME_COLUMNS))?;

    Ok(())
}
