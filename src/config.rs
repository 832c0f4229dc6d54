use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Base URL of this service, used for gateway back/notification URLs
    pub base_url: String,
    /// Base URL of the buyer-facing ticket shop, used for redirects
    pub shop_url: String,
    pub mp_access_token: String,
    pub mp_api_base: String,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("TAQUILLA_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "taquilla.db".to_string()),
            shop_url: env::var("SHOP_URL").unwrap_or_else(|_| base_url.clone()),
            base_url,
            mp_access_token: env::var("MP_ACCESS_TOKEN").unwrap_or_default(),
            mp_api_base: env::var("MP_API_BASE")
                .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
