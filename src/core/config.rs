use std::env;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_PORT: u16 = 8080;

const DEFAULT_SYSTEM_PROMPT: &str =
    "Summarize the following text concisely. Reply with the summary only.";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,
    pub summary_system_prompt: String,
    pub messaging_access_token: String,
    pub messaging_channel_secret: String,
    pub messaging_recipient_id: String,
    pub storage_client_id: String,
    pub storage_client_secret: String,
    pub storage_refresh_token: String,
    pub storage_folder_path: String,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Required credentials fail the load (and therefore process startup);
    /// tuning knobs fall back to defaults when unset but fail on values
    /// that do not parse.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|e| format!("OPENAI_API_KEY: {e}"))?,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            openai_max_tokens: parse_optional("OPENAI_MAX_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS)?,
            openai_temperature: parse_temperature()?,
            summary_system_prompt: env::var("SUMMARY_SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
            messaging_access_token: env::var("LINE_CHANNEL_ACCESS_TOKEN")
                .map_err(|e| format!("LINE_CHANNEL_ACCESS_TOKEN: {e}"))?,
            messaging_channel_secret: env::var("LINE_CHANNEL_SECRET")
                .map_err(|e| format!("LINE_CHANNEL_SECRET: {e}"))?,
            messaging_recipient_id: env::var("LINE_USER_ID")
                .map_err(|e| format!("LINE_USER_ID: {e}"))?,
            storage_client_id: env::var("DROPBOX_CLIENT_ID")
                .map_err(|e| format!("DROPBOX_CLIENT_ID: {e}"))?,
            storage_client_secret: env::var("DROPBOX_CLIENT_SECRET")
                .map_err(|e| format!("DROPBOX_CLIENT_SECRET: {e}"))?,
            storage_refresh_token: env::var("DROPBOX_REFRESH_TOKEN")
                .map_err(|e| format!("DROPBOX_REFRESH_TOKEN: {e}"))?,
            storage_folder_path: env::var("DROPBOX_FOLDER_PATH").unwrap_or_default(),
            port: parse_optional("PORT", DEFAULT_PORT)?,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|e| format!("{name}: {e}")),
        Err(_) => Ok(default),
    }
}

fn parse_temperature() -> Result<f32, String> {
    let t = parse_optional("OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?;
    if !(0.0..=1.0).contains(&t) {
        return Err(format!("OPENAI_TEMPERATURE: {t} is outside [0, 1]"));
    }
    Ok(t)
}
