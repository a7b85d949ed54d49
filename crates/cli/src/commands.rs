use crate::cli::InputArgs;
use anyhow::{Context, Result};
use relational_model::{Catalog, Group, Grouper, IncludeSpec, LinkReport, Linker, SchemaConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let path = path.context("--schema is required")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SchemaConfig::from_json(&text),
        _ => SchemaConfig::from_toml(&text),
    }
    .with_context(|| format!("invalid schema {}", path.display()))?;

    let catalog = config.into_catalog()?;
    log::debug!("Loaded schema with {} types", catalog.type_names().len());
    Ok(catalog)
}

fn read_input(path: Option<&Path>) -> Result<serde_json::Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn hydrate(catalog: &Catalog, input: &InputArgs) -> Result<(Group, LinkReport)> {
    let data = read_input(input.input.as_deref())?;
    let mut group = Grouper::new(catalog).group(&input.type_name, &data)?;
    let report = Linker::new(catalog).link(&mut group.pool)?;
    Ok((group, report))
}

pub fn project(
    catalog: &Catalog,
    input: &InputArgs,
    include: Option<&str>,
    pretty: bool,
) -> Result<String> {
    let include = match include {
        Some(text) => {
            let value: serde_json::Value =
                serde_json::from_str(text).context("--include is not valid JSON")?;
            IncludeSpec::from_json(&value)?
        }
        None => IncludeSpec::none(),
    };

    let (group, _) = hydrate(catalog, input)?;
    let tree = group.project(&include);
    let out = if pretty {
        serde_json::to_string_pretty(&tree)?
    } else {
        serde_json::to_string(&tree)?
    };
    Ok(out)
}

#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    root: serde_json::Value,
    entities: usize,
    links: usize,
    types: BTreeMap<&'a str, usize>,
    resolved: usize,
    through: usize,
    unresolved: usize,
}

pub fn inspect(catalog: &Catalog, input: &InputArgs) -> Result<String> {
    let (group, report) = hydrate(catalog, input)?;
    let (entities, links) = group.pool.stats();
    let output = InspectOutput {
        root: group.root().id()?.to_json(),
        entities,
        links,
        types: group.pool.counts(),
        resolved: report.resolved,
        through: report.deferred,
        unresolved: report.unresolved,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn check(catalog: &Catalog) -> String {
    catalog.type_names().join("\n")
}
