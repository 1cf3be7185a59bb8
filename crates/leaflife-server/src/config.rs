use std::path::PathBuf;

use clap::Parser;

/// Runtime configuration, from flags or the environment.
#[derive(Parser, Debug)]
#[command(name = "leaflife")]
#[command(version)]
#[command(about = "Leaf disease classification API", long_about = None)]
pub struct Args {
    /// Directory holding the model checkpoint and graph
    #[arg(long, env = "LEAF_MODEL_DIR", default_value = "model")]
    pub model_dir: PathBuf,

    /// Training dataset root, one subfolder per class
    #[arg(long, env = "LEAF_TRAIN_DIR", default_value = "dataset/train")]
    pub train_dir: PathBuf,

    /// Gemini API key; disease info is stubbed when absent
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "leaflife",
            "--model-dir",
            "/opt/leaf/model",
            "--train-dir",
            "/data/train",
            "--host",
            "127.0.0.1",
        ])
        .unwrap();

        assert_eq!(args.model_dir, PathBuf::from("/opt/leaf/model"));
        assert_eq!(args.train_dir, PathBuf::from("/data/train"));
        assert_eq!(args.host, "127.0.0.1");
    }

    #[test]
    fn defaults_for_paths() {
        let args = Args::try_parse_from(["leaflife"]).unwrap();
        assert_eq!(args.model_dir, PathBuf::from("model"));
        assert_eq!(args.train_dir, PathBuf::from("dataset/train"));
        assert_eq!(args.host, "0.0.0.0");
    }
}
