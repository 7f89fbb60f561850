//! NF-e payload in the provider's JSON schema (`POST /v2/nfe?ref=...`).
//!
//! Field names follow the provider contract verbatim. Monetary and quantity
//! fields are pre-formatted decimal strings; the provider validates them as
//! text, so they are never emitted as JSON numbers.

use serde::{Deserialize, Serialize};

/// One line of the document (`items[]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    /// 1-based position in submission order.
    pub numero_item: u32,
    pub codigo_produto: String,
    pub descricao: String,
    pub cfop: String,
    pub codigo_ncm: String,
    pub unidade_comercial: String,
    pub quantidade_comercial: String,
    pub valor_unitario_comercial: String,
    pub valor_bruto: String,
    pub unidade_tributavel: String,
    pub quantidade_tributavel: String,
    pub valor_unitario_tributavel: String,
    pub icms_origem: String,
    pub icms_situacao_tributaria: String,
    pub pis_situacao_tributaria: String,
    pub cofins_situacao_tributaria: String,
}

/// Full emission payload. Built fresh per attempt and never mutated after
/// submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRequest {
    pub natureza_operacao: String,
    pub data_emissao: String,
    /// 0 = entrada, 1 = saída.
    pub tipo_documento: u8,
    /// 1 = normal, 2 = complementar, 3 = ajuste, 4 = devolução.
    pub finalidade_emissao: u8,
    /// 1 = operação interna, 2 = interestadual.
    pub local_destino: u8,
    pub consumidor_final: u8,
    pub presenca_comprador: u8,

    pub cnpj_emitente: String,
    pub nome_emitente: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_fantasia_emitente: Option<String>,
    pub logradouro_emitente: String,
    pub numero_emitente: String,
    pub bairro_emitente: String,
    pub municipio_emitente: String,
    pub uf_emitente: String,
    pub cep_emitente: String,
    pub inscricao_estadual_emitente: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone_emitente: Option<String>,
    pub regime_tributario_emitente: u8,

    pub nome_destinatario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf_destinatario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj_destinatario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inscricao_estadual_destinatario: Option<String>,
    pub indicador_inscricao_estadual_destinatario: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone_destinatario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_destinatario: Option<String>,
    pub logradouro_destinatario: String,
    pub numero_destinatario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complemento_destinatario: Option<String>,
    pub bairro_destinatario: String,
    pub municipio_destinatario: String,
    pub uf_destinatario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep_destinatario: Option<String>,
    pub pais_destinatario: String,

    pub valor_produtos: String,
    pub valor_frete: String,
    pub valor_seguro: String,
    pub valor_desconto: String,
    pub valor_total: String,
    /// 0 = por conta do emitente, 9 = sem frete.
    pub modalidade_frete: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub informacoes_adicionais_contribuinte: Option<String>,

    pub items: Vec<DocumentItem>,
}
