use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use ledger::{CancelToken, ComplaintMetadata, EvidenceSubmission, TransactionId};

use crate::error::ApiError;
use crate::state::SharedState;

const DEFAULT_TITLE: &str = "Denúncia sem Título";
const NOT_APPLICABLE: &str = "N/A";

/// Request body for `POST /api/submit-complaint`.
///
/// Only `descricao`, `assunto` and `finalidade` are required; every other
/// field falls back to the intake form's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitComplaintRequest {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub conselho: Option<String>,
    pub categoria: Option<String>,
    pub anonymous: Option<bool>,
    pub ouvidoria_anonima: Option<bool>,
    pub assunto: Option<String>,
    pub prioridade: Option<String>,
    pub finalidade: Option<String>,
    pub codigos_anteriores: Option<String>,
    #[serde(rename = "file_hashes")]
    pub file_hashes: Option<Vec<String>>,
    #[serde(rename = "ia_analysis")]
    pub ia_analysis: Option<Value>,
}

/// Wire names of the optional fields and the JSON type each one must have.
const FIELD_TYPES: &[(&str, FieldType)] = &[
    ("titulo", FieldType::Text),
    ("descricao", FieldType::Text),
    ("conselho", FieldType::Text),
    ("categoria", FieldType::Text),
    ("anonymous", FieldType::Flag),
    ("ouvidoriaAnonima", FieldType::Flag),
    ("assunto", FieldType::Text),
    ("prioridade", FieldType::Text),
    ("finalidade", FieldType::Text),
    ("codigosAnteriores", FieldType::Text),
    ("file_hashes", FieldType::TextList),
];

#[derive(Clone, Copy)]
enum FieldType {
    Text,
    Flag,
    TextList,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Text, Value::String(_)) => true,
            (FieldType::Flag, Value::Bool(_)) => true,
            (FieldType::TextList, Value::Array(items)) => items.iter().all(Value::is_string),
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldType::Text => "um texto",
            FieldType::Flag => "um booleano",
            FieldType::TextList => "uma lista de textos",
        }
    }
}

impl SubmitComplaintRequest {
    /// Decodes a request body, naming the offending field when a value has
    /// the wrong JSON type.
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        let Value::Object(fields) = &body else {
            return Err(ApiError::BadRequest(
                "O corpo da requisição deve ser um objeto JSON.".to_string(),
            ));
        };

        for (name, kind) in FIELD_TYPES {
            if let Some(value) = fields.get(*name) {
                if !kind.accepts(value) {
                    return Err(ApiError::BadRequest(format!(
                        "O campo '{name}' deve ser {}.",
                        kind.describe()
                    )));
                }
            }
        }

        serde_json::from_value(body)
            .map_err(|e| ApiError::BadRequest(format!("Formato JSON inválido: {e}")))
    }

    /// Validates the request and fills in defaults.
    pub fn into_submission(self) -> Result<EvidenceSubmission, ApiError> {
        let descricao = required(self.descricao, "descricao")?;
        let assunto = required(self.assunto, "assunto")?;
        let finalidade = required(self.finalidade, "finalidade")?;

        let metadata = ComplaintMetadata {
            titulo: Some(self.titulo.unwrap_or_else(|| DEFAULT_TITLE.to_string())),
            descricao: Some(descricao),
            conselho: Some(self.conselho.unwrap_or_else(|| NOT_APPLICABLE.to_string())),
            categoria: Some(self.categoria.unwrap_or_else(|| NOT_APPLICABLE.to_string())),
            anonymous: self.anonymous.unwrap_or(true),
            ouvidoria_anonima: self.ouvidoria_anonima.unwrap_or(false),
            assunto: Some(assunto),
            prioridade: Some(self.prioridade.unwrap_or_default()),
            finalidade: Some(finalidade),
            codigos_anteriores: Some(self.codigos_anteriores.unwrap_or_default()),
        };

        Ok(EvidenceSubmission {
            metadata,
            file_hashes: self.file_hashes.unwrap_or_default(),
            ia_analysis: self.ia_analysis,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!(
            "O campo '{field}' é obrigatório."
        ))),
    }
}

/// Response body for `POST /api/submit-complaint`.
#[derive(Debug, Serialize)]
pub struct SubmitComplaintResponse {
    pub success: bool,
    pub complaint_id: TransactionId,
    pub block_index: u64,
}

/// `POST /api/submit-complaint`
///
/// Stages the complaint and commits it into a new block before answering.
/// Mining runs on the blocking pool; if it outlives the commit deadline the
/// search is cancelled and the complaint is not recorded.
pub async fn submit_complaint(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitComplaintResponse>, ApiError> {
    let Json(body) =
        payload.map_err(|e| ApiError::BadRequest(format!("Formato JSON inválido: {e}")))?;
    let submission = SubmitComplaintRequest::from_json(body)?.into_submission()?;

    let cancel = CancelToken::new();
    let task = {
        let ledger = state.ledger.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || ledger.submit(submission, Some(&cancel)))
    };

    let submitted = match tokio::time::timeout(state.commit_timeout, task).await {
        Ok(joined) => joined??,
        Err(_) => {
            cancel.cancel();
            return Err(ApiError::CommitTimedOut);
        }
    };

    info!(
        complaint_id = %submitted.id,
        block_index = submitted.block.index,
        "complaint recorded"
    );

    Ok(Json(SubmitComplaintResponse {
        success: true,
        complaint_id: submitted.id,
        block_index: submitted.block.index,
    }))
}

/// `GET /api/complaints`
///
/// Every committed complaint, oldest first.
pub async fn list_complaints(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let ledger = state.ledger.clone();
    let complaints = tokio::task::spawn_blocking(move || {
        ledger.read(|l| serde_json::to_value(l.query_all_transactions().collect::<Vec<_>>()))
    })
    .await??
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(json!({ "success": true, "complaints": complaints })))
}
