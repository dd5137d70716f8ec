use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{AuthTokens, PlaybackRequest, ProfileId, ProgressCheckpoint, TitleId};
use crate::utils::errors::{AppError, AppResult};

/// Thin client over the streaming backend's REST API.
#[derive(Clone)]
pub struct StreamingApi {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<RwLock<Option<AuthTokens>>>,
}

impl std::fmt::Debug for StreamingApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl StreamingApi {
    pub fn new(base_url: &str, tokens: Option<AuthTokens>, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            tokens: Arc::new(RwLock::new(tokens)),
        })
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.as_ref().map(|t| t.access.clone())
    }

    /// `{base}/seg/seg/` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push("");
        }
        url
    }

    /// Send an authorized request, refreshing the access token once on a 401.
    async fn execute<F>(&self, build: F) -> AppResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response = self.send_once(&build).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        debug!("Access token rejected, attempting refresh");
        self.refresh_access_token().await?;

        let retried = self.send_once(&build).await?;
        Self::check(retried).await
    }

    async fn send_once<F>(&self, build: &F) -> AppResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let mut request = build(&self.client);
        if let Some(tokens) = self.tokens.read().await.as_ref() {
            request = request.bearer_auth(&tokens.access);
        }
        Ok(request.send().await?)
    }

    async fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_default();

        Err(match status {
            StatusCode::UNAUTHORIZED => AppError::Authentication(detail),
            StatusCode::FORBIDDEN => AppError::PlaybackUnavailable(detail),
            StatusCode::NOT_FOUND => AppError::TitleNotFound(detail),
            _ => AppError::Http {
                status: status.as_u16(),
                detail,
            },
        })
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> AppResult<String> {
        let refresh = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh.clone())
            .ok_or_else(|| AppError::Authentication("No refresh token available".to_string()))?;

        let url = self.endpoint(&["users", "token", "refresh"]);
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Token refresh failed: {}", response.status());
            return Err(AppError::Authentication(format!(
                "Token refresh failed: {}",
                response.status()
            )));
        }

        let body: RefreshResponse = response.json().await?;
        if let Some(tokens) = self.tokens.write().await.as_mut() {
            tokens.access = body.access.clone();
        }

        info!("Access token refreshed");
        Ok(body.access)
    }

    pub async fn get_title(&self, title_id: &TitleId) -> AppResult<TitleDto> {
        let url = self.endpoint(&["contenido", "peliculas", title_id.as_str()]);
        let response = self.execute(|client| client.get(url.clone())).await?;
        Ok(response.json().await?)
    }

    pub async fn get_play_url(
        &self,
        title_id: &TitleId,
        profile_id: &ProfileId,
        request: &PlaybackRequest,
    ) -> AppResult<PlayResponse> {
        let url = self.endpoint(&["streaming", "play", title_id.as_str()]);

        let mut query = vec![("perfil", profile_id.to_string())];
        if let Some(quality) = &request.quality {
            query.push(("calidad", quality.clone()));
        }
        if let Some(trailer) = request.trailer {
            query.push(("trailer", trailer.to_string()));
        }

        let response = self
            .execute(|client| client.get(url.clone()).query(&query))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn fetch_streams(&self, title_id: &TitleId) -> AppResult<StreamListResponse> {
        let url = self.endpoint(&["streaming", "list", title_id.as_str()]);
        let response = self.execute(|client| client.get(url.clone())).await?;
        Ok(response.json().await?)
    }

    pub async fn fetch_progress(
        &self,
        profile_id: &ProfileId,
        title_id: &TitleId,
    ) -> AppResult<ProgressResponse> {
        let url = self.endpoint(&["history", "progress", title_id.as_str()]);
        let query = [("perfil", profile_id.to_string())];
        let response = self
            .execute(|client| client.get(url.clone()).query(&query))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn post_progress(&self, checkpoint: &ProgressCheckpoint) -> AppResult<()> {
        let url = self.endpoint(&["history", "progress"]);
        let body = serde_json::json!({
            "pelicula_id": checkpoint.title_id.to_wire_value(),
            "perfil_id": checkpoint.profile_id.to_wire_value(),
            "progreso_segundos": checkpoint.position_seconds,
            "terminado": checkpoint.finished,
        });

        self.execute(|client| client.post(url.clone()).json(&body))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

#[derive(Debug, Deserialize)]
pub struct TitleDto {
    pub id_pelicula: i64,
    pub titulo: String,
    pub descripcion: Option<String>,
    pub fecha_estreno: Option<NaiveDate>,
    pub duracion: Option<u32>,
    pub clasificacion: Option<String>,
    #[serde(default)]
    pub generos_detalle: Vec<GenreDto>,
}

#[derive(Debug, Deserialize)]
pub struct GenreDto {
    pub nombre: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayResponse {
    pub url: String,
    pub calidad: Option<String>,
    pub asset_id: Option<i64>,
    pub historial_id: Option<i64>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub es_trailer: bool,
    /// Unix seconds.
    pub expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StreamListResponse {
    #[serde(default)]
    pub assets: Vec<AssetDto>,
}

#[derive(Debug, Deserialize)]
pub struct AssetDto {
    pub asset_id: i64,
    pub origen: String,
    pub ruta: String,
    pub calidad: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub es_trailer: bool,
    pub creado_en: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub progreso_segundos: i64,
    #[serde(default)]
    pub terminado: bool,
}
