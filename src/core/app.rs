use crate::core::handler::{HandlerRegistry, HandlerType};
use crate::core::hooks::{Hook, HookFn, HookRegistry};
use crate::core::output::{OutputHandler, OutputSink};
use crate::domain::config::{ConfigDict, ConfigStore};
use crate::domain::error::{JsonExtError, JsonExtResult};
use crate::ext::{table::TableOutputHandler, text::TextOutputHandler};
use crate::infrastructure::config::{default_config_files, ConfigLoader, TomlConfigDecoder};
use clap::parser::MatchesError;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extension entry point, called once while the app is set up
pub type ExtensionFn = fn(&mut App) -> JsonExtResult<()>;

/// Application meta-data
#[derive(Debug, Clone)]
pub struct AppMeta {
    /// Application label, also the config section and env prefix
    pub label: String,
    /// Command line arguments, without the program name
    pub argv: Vec<String>,
    /// Label of the output handler to use unless overridden
    pub output_handler: String,
    /// Label of the config decoder
    pub config_handler: String,
    /// Config files parsed during setup; `None` means the default locations
    pub config_files: Option<Vec<PathBuf>>,
    /// Values merged under any loaded configuration
    pub config_defaults: ConfigDict,
}

impl AppMeta {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            argv: Vec::new(),
            output_handler: "text".to_string(),
            config_handler: "toml".to_string(),
            config_files: None,
            config_defaults: ConfigDict::new(),
        }
    }
}

/// Host application
///
/// Owns the handler and hook registries, the configuration store and the
/// output sink, and drives the `setup` → `run` → `close` lifecycle.
pub struct App {
    meta: AppMeta,
    handlers: HandlerRegistry,
    hooks: HookRegistry,
    config: ConfigStore,
    config_loader: Option<ConfigLoader>,
    output: Option<Arc<dyn OutputHandler>>,
    sink: OutputSink,
    args: Option<Command>,
    builtin_args: Vec<&'static str>,
    matches: Option<ArgMatches>,
    extensions: Vec<(String, ExtensionFn)>,
    loaded_extensions: Vec<String>,
    is_setup: bool,
}

impl App {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_meta(AppMeta::new(label))
    }

    pub fn with_meta(meta: AppMeta) -> Self {
        let config = ConfigStore::with_env_prefix(meta.label.clone());
        Self {
            meta,
            handlers: HandlerRegistry::new(),
            hooks: HookRegistry::new(),
            config,
            config_loader: None,
            output: None,
            sink: OutputSink::stdio(),
            args: None,
            builtin_args: Vec::new(),
            matches: None,
            extensions: Vec::new(),
            loaded_extensions: Vec::new(),
            is_setup: false,
        }
    }

    /// Replace the output sink
    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    /// Queue an extension to be loaded during setup
    pub fn add_extension(&mut self, name: impl Into<String>, load: ExtensionFn) {
        self.extensions.push((name.into(), load));
    }

    /// Use `command` as the base argument parser. Must be called before setup.
    pub fn set_args(&mut self, command: Command) {
        self.args = Some(command);
    }

    pub fn meta(&self) -> &AppMeta {
        &self.meta
    }

    pub fn argv(&self) -> &[String] {
        &self.meta.argv
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn register_hook(&mut self, hook: Hook, callback: HookFn) {
        self.hooks.register(hook, callback, 0);
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    pub fn sink_mut(&mut self) -> &mut OutputSink {
        &mut self.sink
    }

    pub fn matches(&self) -> Option<&ArgMatches> {
        self.matches.as_ref()
    }

    pub fn loaded_extensions(&self) -> &[String] {
        &self.loaded_extensions
    }

    /// Label of the active output handler
    pub fn output_handler_label(&self) -> &str {
        &self.meta.output_handler
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    /// Prepare the application: handlers, extensions, configuration and the
    /// argument parser. Calling it again is a no-op.
    pub fn setup(&mut self) -> JsonExtResult<()> {
        if self.is_setup {
            return Ok(());
        }
        tracing::debug!("now setting up the '{}' application", self.meta.label);

        // a retry after a failed setup keeps what the first attempt registered
        if !self.handlers.defined(HandlerType::Output) {
            self.handlers.define(HandlerType::Output)?;
            self.handlers
                .register_output(Arc::new(TextOutputHandler), false)?;
            self.handlers
                .register_output(Arc::new(TableOutputHandler::default()), false)?;
        }
        if !self.handlers.defined(HandlerType::Config) {
            self.handlers.define(HandlerType::Config)?;
            self.handlers
                .register_config(Arc::new(TomlConfigDecoder), false)?;
        }

        self.run_hooks(Hook::PreSetup)?;
        self.load_extensions()?;
        self.setup_config_handler()?;
        self.setup_output_handler()?;
        self.setup_arg_handler();
        self.is_setup = true;

        self.run_hooks(Hook::PostSetup)?;
        Ok(())
    }

    /// Parse arguments and run the pre-run hooks. Sets the app up first if
    /// that has not happened yet.
    pub fn run(&mut self) -> JsonExtResult<ArgMatches> {
        self.setup()?;

        let command = self
            .args
            .clone()
            .ok_or_else(|| JsonExtError::Framework("argument parser not set up".to_string()))?;
        let argv = std::iter::once(self.meta.label.clone()).chain(self.meta.argv.iter().cloned());
        let matches = command.try_get_matches_from(argv)?;

        // host-defined args with these ids are left to the host
        if self.owns_arg("config") {
            let files: Vec<String> = matches
                .try_get_many::<String>("config")
                .map_err(matches_error)?
                .map(|files| files.cloned().collect())
                .unwrap_or_default();
            for file in files {
                self.parse_config_file(Path::new(&file))?;
            }
        }
        if self.owns_arg("quiet")
            && matches
                .try_get_one::<bool>("quiet")
                .map_err(matches_error)?
                .copied()
                .unwrap_or(false)
        {
            self.sink.suppress();
        }
        if self.owns_arg("output") {
            if let Some(label) = matches
                .try_get_one::<String>("output")
                .map_err(matches_error)?
                .cloned()
            {
                self.set_output_handler(&label)?;
            }
        }
        self.matches = Some(matches.clone());

        self.run_hooks(Hook::PreRun)?;
        Ok(matches)
    }

    /// Run the post-run hooks
    pub fn close(&mut self) -> JsonExtResult<()> {
        tracing::debug!("closing the '{}' application", self.meta.label);
        self.run_hooks(Hook::PostRun)
    }

    /// Load an extension unless one with the same name is already loaded
    pub fn load_extension(&mut self, name: &str, load: ExtensionFn) -> JsonExtResult<()> {
        if self.loaded_extensions.iter().any(|loaded| loaded == name) {
            tracing::debug!("extension '{}' already loaded", name);
            return Ok(());
        }
        tracing::debug!("loading extension '{}'", name);
        load(self)?;
        self.loaded_extensions.push(name.to_string());
        Ok(())
    }

    /// Switch the active output handler
    pub fn set_output_handler(&mut self, label: &str) -> JsonExtResult<()> {
        let handler = self.handlers.get_output(label)?;
        tracing::debug!("output handler set to '{}'", handler.label());
        self.meta.output_handler = label.to_string();
        self.output = Some(handler);
        Ok(())
    }

    /// Append an argument to the parser; only valid once the app is set up
    pub fn add_argument(&mut self, arg: Arg) -> JsonExtResult<()> {
        if !self.is_setup {
            return Err(JsonExtError::Framework(
                "arguments can only be added after setup".to_string(),
            ));
        }
        let command = self
            .args
            .take()
            .unwrap_or_else(|| Command::new(self.meta.label.clone()));
        self.args = Some(command.arg(arg));
        Ok(())
    }

    /// Parse a config file with the configured decoder, overwriting
    /// existing values
    pub fn parse_config_file(&mut self, path: &Path) -> JsonExtResult<bool> {
        let loader = self
            .config_loader
            .clone()
            .ok_or_else(|| JsonExtError::Framework("config handler not set up".to_string()))?;
        loader.parse_file(&mut self.config, path)
    }

    /// Render `data` through the active output handler and write it to the
    /// sink. Returns the rendered text.
    pub fn render<T>(&mut self, data: &T, template: Option<&str>) -> JsonExtResult<String>
    where
        T: Serialize + ?Sized,
    {
        self.run_hooks(Hook::PreRender)?;

        let value = serde_json::to_value(data)?;
        let handler = self
            .output
            .clone()
            .ok_or_else(|| JsonExtError::Framework("output handler not set up".to_string()))?;
        tracing::debug!("rendering output via '{}'", handler.label());
        let text = handler.render(&value, template)?;

        if handler.bypasses_suppression() {
            self.sink.restore();
        }
        if text.is_empty() {
            tracing::debug!("nothing to render");
        } else if text.ends_with('\n') {
            self.sink.write_out(&text)?;
        } else {
            self.sink.write_out(&format!("{}\n", text))?;
        }

        self.run_hooks(Hook::PostRender)?;
        Ok(text)
    }

    /// Write incidental output, dropped while the sink is suppressed
    pub fn print(&mut self, text: &str) -> JsonExtResult<()> {
        self.sink.write_out(&format!("{}\n", text))?;
        Ok(())
    }

    /// Write incidental diagnostics to stderr, dropped while suppressed
    pub fn print_err(&mut self, text: &str) -> JsonExtResult<()> {
        self.sink.write_err(&format!("{}\n", text))?;
        Ok(())
    }

    fn run_hooks(&mut self, hook: Hook) -> JsonExtResult<()> {
        for callback in self.hooks.callbacks(hook) {
            tracing::debug!("running '{}' hook callback", hook);
            callback(self)?;
        }
        Ok(())
    }

    fn load_extensions(&mut self) -> JsonExtResult<()> {
        let pending = std::mem::take(&mut self.extensions);
        for (name, load) in pending {
            self.load_extension(&name, load)?;
        }
        Ok(())
    }

    fn setup_config_handler(&mut self) -> JsonExtResult<()> {
        let decoder = self.handlers.get_config(&self.meta.config_handler)?;
        tracing::debug!("config handler set to '{}'", decoder.label());

        let files = self
            .meta
            .config_files
            .clone()
            .unwrap_or_else(|| default_config_files(&self.meta.label, decoder.file_extension()));
        self.config_loader = Some(ConfigLoader::new(decoder));

        let defaults = self.meta.config_defaults.clone();
        self.config.merge(&defaults, false);

        for file in files {
            if file.exists() {
                self.parse_config_file(&file)?;
            } else {
                tracing::debug!("config file '{}' does not exist, skipping", file.display());
            }
        }
        Ok(())
    }

    fn setup_output_handler(&mut self) -> JsonExtResult<()> {
        let label = self
            .config
            .get(&self.meta.label, "output_handler")
            .unwrap_or_else(|| self.meta.output_handler.clone());
        self.set_output_handler(&label)
    }

    fn owns_arg(&self, id: &str) -> bool {
        self.builtin_args.contains(&id)
    }

    fn setup_arg_handler(&mut self) {
        let mut command = self
            .args
            .take()
            .unwrap_or_else(|| Command::new(self.meta.label.clone()));

        let has = |command: &Command, id: &str| {
            command
                .get_arguments()
                .any(|arg| arg.get_id().as_str() == id)
        };
        self.builtin_args = ["config", "quiet", "debug", "output"]
            .into_iter()
            .filter(|id| !has(&command, *id))
            .collect();

        if !has(&command, "config") {
            command = command.arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .action(ArgAction::Append)
                    .global(true)
                    .help("Additional config file to load"),
            );
        }
        if !has(&command, "quiet") {
            command = command.arg(
                Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .global(true)
                    .help("Suppress incidental output"),
            );
        }
        if !has(&command, "debug") {
            command = command.arg(
                Arg::new("debug")
                    .long("debug")
                    .action(ArgAction::SetTrue)
                    .global(true)
                    .help("Enable debug logging"),
            );
        }
        if !has(&command, "output") {
            command = command.arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("HANDLER")
                    .global(true)
                    .help("Output handler to render with"),
            );
        }
        self.args = Some(command);
    }
}

fn matches_error(error: MatchesError) -> JsonExtError {
    JsonExtError::Framework(format!("invalid argument access: {}", error))
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("meta", &self.meta)
            .field("handlers", &self.handlers)
            .field("hooks", &self.hooks)
            .field("config", &self.config)
            .field("is_setup", &self.is_setup)
            .finish_non_exhaustive()
    }
}
