use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    name: String,
    brand: Option<String>,
    price: Option<f64>,
    original_price: Option<f64>,
    discount: Option<i64>,
    url: Option<String>,
    image_url: Option<String>,
    created_at: NaiveDateTime,
}

impl From<shelfscan_db::ProductRow> for ProductItem {
    fn from(row: shelfscan_db::ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            brand: row.brand,
            price: row.price,
            original_price: row.original_price,
            discount: row.discount,
            url: row.url,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub brand: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct BrandList {
    brands: Vec<String>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let filter = shelfscan_db::ProductFilter {
        limit: normalize_limit(query.limit),
        offset: normalize_offset(query.offset),
        brand: query.brand.filter(|b| !b.trim().is_empty()),
    };
    let rows = shelfscan_db::list_products(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let Path(id) = id.map_err(|rejection| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("invalid product id: {}", rejection.body_text()),
        )
    })?;
    let row = shelfscan_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("product {id} not found"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<BrandList>>, ApiError> {
    let brands = shelfscan_db::list_brands(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: BrandList { brands },
        meta: ResponseMeta::new(req_id.0),
    }))
}
