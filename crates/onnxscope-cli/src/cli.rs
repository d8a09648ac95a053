use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "onnxscope", version, about = "Inspect ONNX model graphs")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print per-node shapes, graph inputs/outputs and the receptive field
    Check {
        /// Local path or gs://<bucket>/<object> locator
        model: String,
    },
    /// Mark the trailing depth/height/width dims of inputs and outputs dynamic
    MakeDynamic {
        /// Local path to the model to rewrite
        model: PathBuf,

        /// Where to write the rewritten model; nothing is written if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_takes_exactly_one_model() {
        let cli = Cli::try_parse_from(["onnxscope", "check", "net.onnx"]).unwrap();
        assert!(matches!(cli.command, Command::Check { ref model } if model == "net.onnx"));
        assert_eq!(cli.log, "warn");

        assert!(Cli::try_parse_from(["onnxscope", "check"]).is_err());
        assert!(Cli::try_parse_from(["onnxscope", "check", "a.onnx", "b.onnx"]).is_err());
    }

    #[test]
    fn make_dynamic_output_is_optional() {
        let cli = Cli::try_parse_from(["onnxscope", "make-dynamic", "in.onnx", "-o", "out.onnx"])
            .unwrap();
        let Command::MakeDynamic { model, output } = cli.command else {
            panic!("expected make-dynamic");
        };
        assert_eq!(model, PathBuf::from("in.onnx"));
        assert_eq!(output, Some(PathBuf::from("out.onnx")));
    }

    #[test]
    fn verifies_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
