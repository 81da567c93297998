//! `devhost port`.

use crate::cli::PortArgs;
use crate::error::Result;
use crate::port::resolve_port;
use crate::ui;

pub fn execute(args: PortArgs) -> Result<()> {
    let lease = resolve_port(args.preferred, args.attempts)?;
    println!("{}", lease.actual);
    if lease.is_fallback() {
        ui::warning(&format!(
            "port {} is in use, using {} instead",
            lease.requested, lease.actual
        ));
    }
    Ok(())
}
