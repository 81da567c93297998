use clap::ValueEnum;
use devhost_config::Target;

/// Build target for config resolution
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum TargetArg {
    /// Browser bundle with the hot dev server
    #[value(name = "browser")]
    Browser,

    /// Server-side (Node) bundle
    #[value(name = "node")]
    Node,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Browser => Target::Browser,
            TargetArg::Node => Target::Node,
        }
    }
}
