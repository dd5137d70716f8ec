mod api;


pub use api::StreamingApi;

use async_trait::async_trait;
use chrono::DateTime;
use std::time::Duration;
use tracing::debug;

use super::traits::{CatalogService, MediaSourceResolver, ProgressStore};
use crate::config::NetworkConfig;
use crate::models::{
    PlaybackInfo, PlaybackRequest, ProfileId, ProgressCheckpoint, SessionContext, StoredProgress,
    StreamOrigin, StreamVariant, TitleId, TitleMetadata,
};
use crate::utils::errors::AppResult;
use api::{AssetDto, PlayResponse, TitleDto};

impl StreamingApi {
    pub fn from_config(network: &NetworkConfig, context: &SessionContext) -> AppResult<Self> {
        Self::new(&network.base_url, context.tokens.clone(), network.timeout())
    }
}

#[async_trait]
impl CatalogService for StreamingApi {
    async fn get_title_metadata(&self, title_id: &TitleId) -> AppResult<TitleMetadata> {
        let dto = self.get_title(title_id).await?;
        Ok(TitleMetadata::from(dto))
    }
}

#[async_trait]
impl MediaSourceResolver for StreamingApi {
    async fn resolve_playback(
        &self,
        title_id: &TitleId,
        profile_id: &ProfileId,
        request: &PlaybackRequest,
    ) -> AppResult<PlaybackInfo> {
        let response = self.get_play_url(title_id, profile_id, request).await?;
        debug!(
            "Resolved stream for {} ({:?})",
            title_id, response.calidad
        );
        Ok(PlaybackInfo::from(response))
    }

    async fn list_streams(&self, title_id: &TitleId) -> AppResult<Vec<StreamVariant>> {
        let response = self.fetch_streams(title_id).await?;
        Ok(response.assets.into_iter().map(StreamVariant::from).collect())
    }
}

#[async_trait]
impl ProgressStore for StreamingApi {
    async fn get_progress(
        &self,
        profile_id: &ProfileId,
        title_id: &TitleId,
    ) -> AppResult<StoredProgress> {
        let response = self.fetch_progress(profile_id, title_id).await?;
        Ok(StoredProgress {
            position: Duration::from_secs(response.progreso_segundos.max(0) as u64),
            finished: response.terminado,
        })
    }

    async fn save_progress(&self, checkpoint: &ProgressCheckpoint) -> AppResult<()> {
        self.post_progress(checkpoint).await
    }
}

impl From<TitleDto> for TitleMetadata {
    fn from(dto: TitleDto) -> Self {
        Self {
            id: TitleId::from(dto.id_pelicula),
            title: dto.titulo,
            synopsis: dto.descripcion,
            release_date: dto.fecha_estreno,
            duration_minutes: dto.duracion,
            rating: dto.clasificacion,
            genres: dto.generos_detalle.into_iter().map(|g| g.nombre).collect(),
        }
    }
}

impl From<PlayResponse> for PlaybackInfo {
    fn from(response: PlayResponse) -> Self {
        Self {
            url: response.url,
            quality: response.calidad.unwrap_or_else(|| "auto".to_string()),
            asset_id: response.asset_id,
            history_id: response.historial_id,
            mime_type: response.mime_type,
            is_trailer: response.es_trailer,
            expires_at: response
                .expires_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

impl From<AssetDto> for StreamVariant {
    fn from(asset: AssetDto) -> Self {
        Self {
            asset_id: asset.asset_id,
            origin: if asset.origen == "remote" {
                StreamOrigin::Remote
            } else {
                StreamOrigin::Local
            },
            location: asset.ruta,
            quality: asset.calidad,
            mime_type: asset.mime_type,
            is_trailer: asset.es_trailer,
            created_at: asset.creado_en,
        }
    }
}
