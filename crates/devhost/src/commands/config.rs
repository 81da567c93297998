//! `devhost config`.

use devhost_config::Target;

use crate::cli::ConfigArgs;
use crate::context::AppContext;
use crate::dump::dump_config;
use crate::error::{Result, ResultExt};
use crate::resolve::ConfigResolver;
use crate::ui;

pub fn execute(args: ConfigArgs) -> Result<()> {
    let cwd = match args.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let ctx = AppContext::load(&cwd, None)?;

    let mut options = ctx.settings.bundler.clone();
    if let Some(port) = args.port {
        options.dev_server.port = Some(port);
    }
    if let Some(custom) = args.custom {
        options.custom.config_path = Some(custom);
    }

    let target = Target::from(args.target);
    let resolved = ConfigResolver::new(&ctx).resolve(&ctx, &options, target)?;

    println!("{}", serde_json::to_string_pretty(&resolved.config)?);

    if args.no_dump {
        ui::info("Skipping config dump");
    } else {
        dump_config(&ctx.runtime(), &resolved.config);
    }

    ui::success(&format!(
        "Resolved {} config ({}) on port {}",
        target,
        ctx.env(),
        resolved.port.actual
    ));
    Ok(())
}
