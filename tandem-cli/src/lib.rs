//! The `tandem build` pipeline: component files in, a static site and the
//! generated component modules out.

pub mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tandem_renderer::{ComponentDef, PageOptions, Registry, render_page, render_route_pages};
use tandem_sfc::{CompiledComponent, compile_component, emit_component_module, emit_components_file};

pub use config::{CONFIG_FILE, Config};

/// Inputs of one build. Flags set here win over the config file.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub entry: PathBuf,
    pub components: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub out_dir: PathBuf,
    /// Component names, entry first.
    pub components: Vec<String>,
    pub written: Vec<PathBuf>,
}

pub fn build(opts: &BuildOptions) -> Result<BuildReport> {
    let config = Config::discover(&opts.entry, opts.config.as_deref())?;
    let strict = opts.strict || config.strict;
    let out_dir = opts
        .out_dir
        .clone()
        .or_else(|| config.out_dir.clone())
        .unwrap_or_else(|| {
            opts.entry
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("dist")
        });

    let mut compiled = Vec::with_capacity(1 + opts.components.len());
    for path in std::iter::once(&opts.entry).chain(&opts.components) {
        compiled.push(compile_file(path, strict)?);
    }

    let mut registry = Registry::new();
    for component in &compiled {
        if registry.contains(component.name()) {
            bail!("component `{}` is defined twice", component.name());
        }
        registry.register(component_def(component));
    }
    registry.validate().context("template validation failed")?;

    let entry = compiled[0].name().to_string();
    let root = registry
        .instantiate(&entry)
        .with_context(|| format!("cannot instantiate `{entry}`"))?;
    let defaults = PageOptions::default();
    let page = PageOptions {
        title: config.title.clone().unwrap_or(defaults.title),
        lang: config.lang.clone().unwrap_or(defaults.lang),
        ..PageOptions::default()
    };

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let mut written = Vec::new();

    let index = render_page(&registry, &root, &page).context("rendering index.html")?;
    written.push(write(&out_dir, "index.html", &index)?);

    if config.prerender_routes {
        for (name, html) in render_route_pages(&registry, &root, &page)
            .context("pre-rendering route pages")?
        {
            written.push(write(&out_dir, &format!("{name}.html"), &html)?);
        }
    }

    written.push(write(&out_dir, "styles.css", &styles(&compiled))?);

    let modules = compiled
        .iter()
        .map(|c| {
            emit_component_module(
                &c.script,
                c.sfc.script_source(),
                c.sfc.template_source(),
                c.sfc.style_source(),
            )
            .with_context(|| format!("generating the module for `{}`", c.name()))
        })
        .collect::<Result<Vec<_>>>()?;
    written.push(write(&out_dir, "components.rs", &emit_components_file(modules))?);

    Ok(BuildReport {
        out_dir,
        components: compiled.iter().map(|c| c.name().to_string()).collect(),
        written,
    })
}

/// Component name of a file: its stem, `Counter.vx` -> `Counter`.
pub fn component_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a component name from {}", path.display()))
}

fn compile_file(path: &Path, strict: bool) -> Result<CompiledComponent> {
    let name = component_name(path)?;
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let compiled = compile_component(&source, &name, strict)
        .with_context(|| format!("failed to compile {}", path.display()))?;
    tracing::debug!(
        component = %name,
        fields = compiled.script.fields.len(),
        methods = compiled.script.methods.len(),
        "compiled"
    );
    Ok(compiled)
}

/// A render-time definition. Handler bodies are compiled into the generated
/// modules; the build only needs their names, so the ones registered here do
/// nothing.
fn component_def(c: &CompiledComponent) -> ComponentDef {
    let mut def =
        ComponentDef::new(c.name(), c.sfc.template_source()).style(c.sfc.style_source());
    for field in &c.script.fields {
        def = if field.routes.is_empty() {
            def.field(&field.name, field.default.clone())
        } else {
            let options: Vec<&str> = field.routes.iter().map(String::as_str).collect();
            let initial = field.default.as_component().map_or("", |c| c.name());
            def.route(&field.name, &options, initial)
        };
    }
    for method in &c.script.methods {
        def = def.method(method, |_, _| {});
    }
    def
}

/// Style blocks in file order.
fn styles(compiled: &[CompiledComponent]) -> String {
    let mut out = String::new();
    for c in compiled {
        let css = c.sfc.style_source().trim();
        if !css.is_empty() {
            out.push_str(&format!("/* {} */\n{css}\n", c.name()));
        }
    }
    out
}

fn write(dir: &Path, file: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(file);
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote");
    Ok(path)
}
