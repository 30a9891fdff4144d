use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{DeleteArgs, ListArgs};
use crate::config::AppConfig;
use crate::store::PersistenceGateway;

pub fn list(args: ListArgs, config: &AppConfig) -> Result<()> {
    let gateway = PersistenceGateway::open(&args.store, config)?;
    let primitives = gateway.list()?;
    info!(store = %gateway.describe(), count = primitives.len(), "listed primitives");

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &primitives)
            .context("failed to serialize primitive json output")?;
        writeln!(output)?;
    } else if primitives.is_empty() {
        writeln!(output, "No primitives found.")?;
    } else {
        for stored in &primitives {
            writeln!(output, "{}\t{}", stored.id, stored.primitive)?;
        }
    }
    output.flush()?;

    Ok(())
}

pub fn delete(args: DeleteArgs, config: &AppConfig) -> Result<()> {
    let gateway = PersistenceGateway::open(&args.store, config)?;

    if !gateway.delete(args.id)? {
        bail!("no primitive with id {} in {}", args.id, gateway.describe());
    }

    info!(id = args.id, store = %gateway.describe(), "deleted primitive");
    println!("Primitive {} deleted.", args.id);
    Ok(())
}
