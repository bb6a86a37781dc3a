//! HTTP handler functions for the dashboard API.

use actix_web::{HttpResponse, http::header, web};
use geodash_boundary::{BoundaryError, no_match_warning};
use geodash_boundary_models::export::{GEOJSON_MIME, download_file_name};
use geodash_boundary_models::{AdminLevel, BoundaryCollection, BoundaryQuery};
use geodash_heat::HeatError;
use geodash_heat::regions::find_region;
use geodash_heat_models::{DateRange, Region};
use geodash_server_models::{
    ApiAdminLevel, ApiBoundaryResponse, ApiBoundarySummary, ApiError, ApiHealth, ApiHeatLayers,
    ApiHeatStats, BoundaryQueryParams, HeatQueryParams,
};

use crate::AppState;

fn error(mut builder: actix_web::HttpResponseBuilder, message: impl Into<String>) -> HttpResponse {
    builder.json(ApiError {
        error: message.into(),
    })
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        heat_enabled: state.heat.is_some(),
    })
}

/// `GET /api/admin-levels`
pub async fn admin_levels() -> HttpResponse {
    let levels: Vec<ApiAdminLevel> = AdminLevel::ALL
        .iter()
        .copied()
        .map(ApiAdminLevel::from)
        .collect();
    HttpResponse::Ok().json(levels)
}

fn boundary_query(params: &BoundaryQueryParams) -> Result<BoundaryQuery, HttpResponse> {
    let level = match params.admin_level {
        Some(value) => AdminLevel::from_value(value)
            .map_err(|e| error(HttpResponse::BadRequest(), e.to_string()))?,
        None => AdminLevel::default(),
    };

    BoundaryQuery::new(&params.name, level)
        .map_err(|e| error(HttpResponse::BadRequest(), e.to_string()))
}

fn boundary_error_response(e: &BoundaryError) -> HttpResponse {
    log::error!("Boundary lookup failed: {e}");
    match e {
        BoundaryError::Service { .. } | BoundaryError::Http(_) | BoundaryError::Parse { .. } => {
            error(HttpResponse::BadGateway(), e.to_string())
        }
        BoundaryError::Config { .. } => error(HttpResponse::InternalServerError(), e.to_string()),
    }
}

async fn resolve(
    state: &AppState,
    params: &BoundaryQueryParams,
) -> Result<(BoundaryQuery, BoundaryCollection), HttpResponse> {
    let query = boundary_query(params)?;
    let collection = state
        .resolver
        .resolve(&query)
        .await
        .map_err(|e| boundary_error_response(&e))?;
    Ok((query, collection))
}

fn warning_for(query: &BoundaryQuery, collection: &BoundaryCollection) -> Option<String> {
    collection.is_empty().then(|| no_match_warning(query))
}

/// `GET /api/boundary`
///
/// Returns the matched boundaries as `GeoJSON`. An empty match is still a
/// 200 with a `warning`.
pub async fn boundary(
    state: web::Data<AppState>,
    params: web::Query<BoundaryQueryParams>,
) -> HttpResponse {
    match resolve(&state, &params).await {
        Ok((query, collection)) => HttpResponse::Ok().json(ApiBoundaryResponse {
            name: query.place_name().to_string(),
            admin_level: query.admin_level().value(),
            warning: warning_for(&query, &collection),
            collection: collection.to_feature_collection(),
        }),
        Err(resp) => resp,
    }
}

/// `GET /api/boundary/summary`
///
/// Returns the boundary table: one row per feature, without geometry.
pub async fn boundary_summary(
    state: web::Data<AppState>,
    params: web::Query<BoundaryQueryParams>,
) -> HttpResponse {
    match resolve(&state, &params).await {
        Ok((query, collection)) => HttpResponse::Ok().json(ApiBoundarySummary::new(
            &collection,
            warning_for(&query, &collection),
        )),
        Err(resp) => resp,
    }
}

/// `Content-Disposition: attachment` for `file_name`.
///
/// Non-ASCII names get an ASCII `filename` fallback plus an RFC 5987
/// `filename*`.
fn attachment(file_name: &str) -> header::ContentDisposition {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();

    let mut parameters = vec![header::DispositionParam::Filename(fallback)];
    if !file_name.is_ascii() {
        parameters.push(header::DispositionParam::FilenameExt(header::ExtendedValue {
            charset: header::Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: file_name.as_bytes().to_vec(),
        }));
    }

    header::ContentDisposition {
        disposition: header::DispositionType::Attachment,
        parameters,
    }
}

/// `GET /api/boundary/download`
///
/// Returns the `GeoJSON` as an attachment named `<name>_boundary.geojson`.
/// There is nothing to download for an empty match (404).
pub async fn boundary_download(
    state: web::Data<AppState>,
    params: web::Query<BoundaryQueryParams>,
) -> HttpResponse {
    match resolve(&state, &params).await {
        Ok((query, collection)) if collection.is_empty() => {
            error(HttpResponse::NotFound(), no_match_warning(&query))
        }
        Ok((query, collection)) => HttpResponse::Ok()
            .content_type(GEOJSON_MIME)
            .insert_header(attachment(&download_file_name(query.place_name())))
            .body(collection.to_geojson_string()),
        Err(resp) => resp,
    }
}

fn heat_request(params: &HeatQueryParams) -> Result<(Region, DateRange), HeatError> {
    let region = find_region(params.region.as_deref())?;
    let range = DateRange::with_defaults(params.start.as_deref(), params.end.as_deref())?;
    Ok((region, range))
}

fn heat_error_response(e: &HeatError) -> HttpResponse {
    log::error!("Heat request failed: {e}");
    match e {
        HeatError::Model(_) | HeatError::UnknownRegion { .. } => {
            error(HttpResponse::BadRequest(), e.to_string())
        }
        HeatError::MissingEnv { .. } => error(HttpResponse::ServiceUnavailable(), e.to_string()),
        HeatError::Config { .. } => error(HttpResponse::InternalServerError(), e.to_string()),
        HeatError::Service { .. } | HeatError::Http(_) | HeatError::Parse { .. } => {
            error(HttpResponse::BadGateway(), e.to_string())
        }
    }
}

fn heat_disabled() -> HttpResponse {
    error(
        HttpResponse::ServiceUnavailable(),
        "Heat dashboard is disabled: set EE_PROJECT and EE_ACCESS_TOKEN",
    )
}

/// `GET /api/heat/layers`
///
/// Returns the temperature and NDVI tile layers for a region and range.
pub async fn heat_layers(
    state: web::Data<AppState>,
    params: web::Query<HeatQueryParams>,
) -> HttpResponse {
    let Some(client) = &state.heat else {
        return heat_disabled();
    };

    let (region, range) = match heat_request(&params) {
        Ok(request) => request,
        Err(e) => return heat_error_response(&e),
    };

    match client.layers(&region, &range).await {
        Ok(layers) => HttpResponse::Ok().json(ApiHeatLayers {
            region,
            range,
            layers,
        }),
        Err(e) => heat_error_response(&e),
    }
}

/// `GET /api/heat/stats`
///
/// Returns region mean and standard deviation of each layer.
pub async fn heat_stats(
    state: web::Data<AppState>,
    params: web::Query<HeatQueryParams>,
) -> HttpResponse {
    let Some(client) = &state.heat else {
        return heat_disabled();
    };

    let (region, range) = match heat_request(&params) {
        Ok(request) => request,
        Err(e) => return heat_error_response(&e),
    };

    match client.stats(&region, &range).await {
        Ok(stats) => HttpResponse::Ok().json(ApiHeatStats {
            region_id: region.id,
            range,
            stats,
        }),
        Err(e) => heat_error_response(&e),
    }
}
