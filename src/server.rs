use crate::app_state::AppState;
use crate::config::ServerConfig;
use crate::pages::{PREDICTION_FAILED, UNSUPPORTED_UPLOAD};
use crate::upload::{allowed_file, content_type, sanitize_filename};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, HttpServer, get, post, web};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use serde_json::json;

const UPLOAD_FIELD: &str = "file";

struct Upload {
    filename: String,
    data: Bytes,
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn render_index(state: &AppState, error: Option<&str>) -> Result<HttpResponse, actix_web::Error> {
    let body = state
        .pages
        .index(error)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(html(body))
}

/// Pulls the `file` part out of the form, ignoring any other parts.
async fn read_upload(
    mut payload: Multipart,
    limit: usize,
) -> Result<Option<Upload>, actix_web::Error> {
    let mut upload = None;
    while let Some(mut field) = payload.try_next().await? {
        let wanted = upload.is_none() && field.name() == Some(UPLOAD_FIELD);
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.try_next().await? {
            if !wanted {
                continue;
            }
            if data.len() + chunk.len() > limit {
                return Err(actix_web::error::ErrorPayloadTooLarge(format!(
                    "Upload exceeds limit of {} bytes",
                    limit
                )));
            }
            data.extend_from_slice(&chunk);
        }

        if wanted {
            upload = Some(Upload {
                filename,
                data: data.freeze(),
            });
        }
    }
    Ok(upload)
}

#[get("/")]
pub async fn home(app_state: web::Data<AppState>) -> Result<HttpResponse, actix_web::Error> {
    render_index(&app_state, None)
}

#[post("/success")]
pub async fn success(
    payload: Multipart,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(upload) = read_upload(payload, app_state.max_upload_size).await? else {
        return render_index(&app_state, None);
    };

    let filename = match sanitize_filename(&upload.filename) {
        Some(name) if allowed_file(&upload.filename) && allowed_file(&name) => name,
        _ => {
            log::info!("Rejected upload '{}'", upload.filename);
            return render_index(&app_state, Some(UNSUPPORTED_UPLOAD));
        }
    };

    let path = app_state
        .uploads
        .save(&filename, &upload.data)
        .await
        .map_err(|e| {
            log::error!("Failed to save upload '{}': {}", filename, e);
            actix_web::error::ErrorInternalServerError("Failed to save upload")
        })?;
    log::debug!("Saved upload to {}", path.display());

    let result = app_state.classify(upload.data).await;
    if result.is_error() {
        return render_index(&app_state, Some(PREDICTION_FAILED));
    }

    let top = result.top();
    log::info!(
        "Classified {} as {} ({:.2}%)",
        filename,
        top.label,
        top.confidence
    );
    let body = app_state
        .pages
        .success(
            &filename,
            &result.predictions(),
            app_state.classifier.options().top_k,
        )
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(html(body))
}

#[get("/static/images/{filename}")]
pub async fn uploaded_image(
    filename: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let filename = filename.into_inner();
    match app_state.uploads.load(&filename).await? {
        Some(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type(&filename))
            .body(bytes)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

#[post("/predict")]
pub async fn predict(
    body: Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let result = app_state.classify(body).await;
    let top = result.top();
    log::info!("Predicted {} ({:.2}%)", top.label, top.confidence);
    Ok(HttpResponse::Ok().json(result))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[get("/get_model_info")]
pub async fn get_model_info(app_state: web::Data<AppState>) -> HttpResponse {
    let classifier = &app_state.classifier;
    let decoder = classifier.decoder();
    let options = classifier.options();
    HttpResponse::Ok().json(json!({
        "model": classifier.model_name(),
        "input_size": [decoder.width(), decoder.height()],
        "labels": classifier.labels().iter().collect::<Vec<_>>(),
        "top_k": options.top_k,
        "threshold": options.threshold,
    }))
}

/// Registers every route; shared by [`startup`] and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(success)
        .service(uploaded_image)
        .service(predict)
        .service(health)
        .service(get_model_info);
}

pub async fn startup(config: ServerConfig, app_state: AppState) -> std::io::Result<()> {
    let max_upload_size = app_state.max_upload_size;
    let app_state = web::Data::new(app_state);

    log::info!("Starting server at {}:{}", config.host, config.port);
    log::info!("Model: {}", config.model_path.display());
    log::info!("Upload directory: {}", config.image_dir.display());
    log::info!(
        "Top-k: {}, threshold: {}%, concurrent inferences: {}",
        config.top_k,
        config.threshold,
        config.max_concurrent_inferences
    );

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(max_upload_size))
            .configure(configure)
    })
    .bind((config.host, config.port))?
    .run()
    .await
}
