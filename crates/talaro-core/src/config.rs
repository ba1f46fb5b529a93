use anyhow::Context as _;

/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field `database_url` is read from
/// `DATABASE_URL`, and so on. Optional fields should carry `#[serde(default = ...)]`.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> anyhow::Result<Self> {
        envy::from_env().context("failed to load config from environment")
    }

    /// Same as [`Config::from_env`] but reads from an explicit iterator (tests, tooling).
    fn from_pairs<I>(pairs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs).context("failed to load config from key/value pairs")
    }
}
