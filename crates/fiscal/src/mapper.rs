//! Sale + emitter -> provider payload.
//!
//! Pure: the same inputs always produce the same `EmissionRequest` (the
//! emission date comes from the sale, never from the clock). Validation
//! failures are `DomainError::Validation` and must block submission.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rust_decimal::Decimal;

use fiscoerp_core::money::{QUANTITY_SCALE, UNIT_VALUE_SCALE, money_string, round_money, to_fixed};
use fiscoerp_core::{DomainError, DomainResult};
use fiscoerp_parties::address::non_blank;
use fiscoerp_parties::{Customer, Emitter, TaxId};
use fiscoerp_sales::{Sale, SaleItem};

use crate::document::{DocumentItem, EmissionRequest};

pub const NATUREZA_OPERACAO_VENDA: &str = "Venda";
pub const TIPO_DOCUMENTO_SAIDA: u8 = 1;
pub const FINALIDADE_NORMAL: u8 = 1;
pub const REGIME_SIMPLES_NACIONAL: u8 = 1;
pub const PRESENCA_PRESENCIAL: u8 = 1;

pub const LOCAL_DESTINO_INTERNA: u8 = 1;
pub const LOCAL_DESTINO_INTERESTADUAL: u8 = 2;

pub const MODALIDADE_FRETE_EMITENTE: u8 = 0;
pub const MODALIDADE_FRETE_SEM_FRETE: u8 = 9;

pub const IE_CONTRIBUINTE: u8 = 1;
pub const IE_NAO_CONTRIBUINTE: u8 = 9;

pub const CFOP_VENDA_INTERNA: &str = "5102";
pub const CFOP_VENDA_INTERESTADUAL: &str = "6102";
pub const NCM_GENERICO: &str = "00000000";

/// Simples Nacional tax situation codes applied to every item.
pub const ICMS_ORIGEM_NACIONAL: &str = "0";
pub const ICMS_CSOSN_SEM_CREDITO: &str = "102";
pub const PIS_COFINS_ISENTA: &str = "07";

/// Substitutes for missing buyer address data.
pub const PLACEHOLDER_STREET: &str = "Não informado";
pub const PLACEHOLDER_NUMBER: &str = "S/N";
pub const PLACEHOLDER_DISTRICT: &str = "Não informado";
pub const PLACEHOLDER_MUNICIPALITY: &str = "São Paulo";
pub const PLACEHOLDER_STATE: &str = "SP";
pub const COUNTRY_BRAZIL: &str = "Brasil";

/// Brasília time (no DST since 2019).
const BRT_OFFSET_SECS: i32 = 3 * 3600;

/// Build the provider payload for a first-time ("normal") sale emission.
pub fn map_sale_to_document(sale: &Sale, emitter: &Emitter) -> DomainResult<EmissionRequest> {
    emitter.validate()?;
    let amounts = validate_sale(sale)?;

    let emitter_state = non_blank(&emitter.address.state).unwrap_or_default().to_uppercase();
    let destination = Destination::from_customer(&sale.customer);
    // A placeholder UF says nothing about where the buyer is.
    let interstate = !destination.placeholder_state && destination.state != emitter_state;

    let items = sale
        .items
        .iter()
        .zip(&amounts.item_gross)
        .enumerate()
        .map(|(idx, (item, gross))| map_item(idx, item, *gross, interstate))
        .collect::<Vec<_>>();

    let a = &emitter.address;
    let (cpf, cnpj) = match &sale.customer.tax_id {
        Some(TaxId::Cpf(d)) => (Some(d.clone()), None),
        Some(TaxId::Cnpj(d)) => (None, Some(d.clone())),
        None => (None, None),
    };
    let buyer_ie = non_blank(&sale.customer.state_registration).map(str::to_string);
    // A buyer with a state registration is a taxpayer, not a final consumer.
    let consumidor_final = u8::from(buyer_ie.is_none());

    Ok(EmissionRequest {
        natureza_operacao: NATUREZA_OPERACAO_VENDA.to_string(),
        data_emissao: format_emission_date(sale.issued_at),
        tipo_documento: TIPO_DOCUMENTO_SAIDA,
        finalidade_emissao: FINALIDADE_NORMAL,
        local_destino: if interstate {
            LOCAL_DESTINO_INTERESTADUAL
        } else {
            LOCAL_DESTINO_INTERNA
        },
        consumidor_final,
        presenca_comprador: PRESENCA_PRESENCIAL,

        cnpj_emitente: emitter.cnpj.digits().to_string(),
        nome_emitente: emitter.legal_name.trim().to_string(),
        nome_fantasia_emitente: non_blank(&emitter.trade_name).map(str::to_string),
        logradouro_emitente: required(&a.street),
        numero_emitente: required(&a.number),
        bairro_emitente: required(&a.district),
        municipio_emitente: required(&a.municipality),
        uf_emitente: emitter_state,
        cep_emitente: a.postal_code_digits().unwrap_or_default(),
        inscricao_estadual_emitente: emitter.state_registration.trim().to_string(),
        telefone_emitente: non_blank(&emitter.phone).map(digits_only),
        regime_tributario_emitente: REGIME_SIMPLES_NACIONAL,

        nome_destinatario: sale.customer.name.trim().to_string(),
        cpf_destinatario: cpf,
        cnpj_destinatario: cnpj,
        indicador_inscricao_estadual_destinatario: if buyer_ie.is_some() {
            IE_CONTRIBUINTE
        } else {
            IE_NAO_CONTRIBUINTE
        },
        inscricao_estadual_destinatario: buyer_ie,
        telefone_destinatario: non_blank(&sale.customer.phone).map(digits_only),
        email_destinatario: non_blank(&sale.customer.email).map(str::to_string),
        logradouro_destinatario: destination.street,
        numero_destinatario: destination.number,
        complemento_destinatario: destination.complement,
        bairro_destinatario: destination.district,
        municipio_destinatario: destination.municipality,
        uf_destinatario: destination.state,
        cep_destinatario: destination.postal_code,
        pais_destinatario: COUNTRY_BRAZIL.to_string(),

        valor_produtos: money_string(amounts.products),
        valor_frete: money_string(sale.freight),
        valor_seguro: money_string(sale.insurance),
        valor_desconto: money_string(sale.discount),
        valor_total: money_string(sale.total),
        modalidade_frete: if sale.freight > Decimal::ZERO {
            MODALIDADE_FRETE_EMITENTE
        } else {
            MODALIDADE_FRETE_SEM_FRETE
        },
        informacoes_adicionais_contribuinte: non_blank(&sale.notes).map(str::to_string),

        items,
    })
}

/// Amounts computed while validating, reused by the mapping.
struct SaleAmounts {
    item_gross: Vec<Decimal>,
    products: Decimal,
}

fn validate_sale(sale: &Sale) -> DomainResult<SaleAmounts> {
    if sale.customer.name.trim().is_empty() {
        return Err(DomainError::validation("customer name is required"));
    }
    if sale.items.is_empty() {
        return Err(DomainError::validation("cannot emit a document without items"));
    }

    let mut item_gross = Vec::with_capacity(sale.items.len());
    for (idx, item) in sale.items.iter().enumerate() {
        let n = idx + 1;
        if item.description.trim().is_empty() {
            return Err(DomainError::validation(format!("item {n}: description is required")));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(format!("item {n}: quantity must be positive")));
        }
        if item.unit_value <= Decimal::ZERO {
            return Err(DomainError::validation(format!("item {n}: unit value must be positive")));
        }
        let computed = item
            .computed_gross()
            .ok_or_else(|| DomainError::validation(format!("item {n}: value out of range")))?;
        if let Some(declared) = item.gross_value {
            if round_money(declared) != computed {
                return Err(DomainError::validation(format!(
                    "item {n}: gross value {} differs from quantity x unit value {}",
                    money_string(declared),
                    money_string(computed)
                )));
            }
        }
        item_gross.push(computed);
    }

    for (name, value) in [
        ("freight", sale.freight),
        ("insurance", sale.insurance),
        ("discount", sale.discount),
    ] {
        if value < Decimal::ZERO {
            return Err(DomainError::validation(format!("{name} cannot be negative")));
        }
    }

    let products = sale
        .products_total()
        .ok_or_else(|| DomainError::validation("products total out of range"))?;
    let expected = sale
        .expected_total()
        .ok_or_else(|| DomainError::validation("sale total out of range"))?;
    if round_money(sale.total) != expected {
        return Err(DomainError::validation(format!(
            "sale total {} differs from items + freight + insurance - discount {}",
            money_string(sale.total),
            money_string(expected)
        )));
    }

    Ok(SaleAmounts {
        item_gross,
        products,
    })
}

fn map_item(idx: usize, item: &SaleItem, gross: Decimal, interstate: bool) -> DocumentItem {
    let quantity = to_fixed(item.quantity, QUANTITY_SCALE);
    let unit_value = to_fixed(item.unit_value, UNIT_VALUE_SCALE);
    let unit = item.unit.trim().to_uppercase();
    let default_cfop = if interstate {
        CFOP_VENDA_INTERESTADUAL
    } else {
        CFOP_VENDA_INTERNA
    };

    DocumentItem {
        numero_item: (idx as u32) + 1,
        codigo_produto: item.product_code.trim().to_string(),
        descricao: item.description.trim().to_string(),
        cfop: non_blank(&item.cfop).unwrap_or(default_cfop).to_string(),
        codigo_ncm: non_blank(&item.ncm)
            .map(digits_only)
            .unwrap_or_else(|| NCM_GENERICO.to_string()),
        unidade_comercial: unit.clone(),
        quantidade_comercial: quantity.clone(),
        valor_unitario_comercial: unit_value.clone(),
        valor_bruto: money_string(gross),
        unidade_tributavel: unit,
        quantidade_tributavel: quantity,
        valor_unitario_tributavel: unit_value,
        icms_origem: ICMS_ORIGEM_NACIONAL.to_string(),
        icms_situacao_tributaria: ICMS_CSOSN_SEM_CREDITO.to_string(),
        pis_situacao_tributaria: PIS_COFINS_ISENTA.to_string(),
        cofins_situacao_tributaria: PIS_COFINS_ISENTA.to_string(),
    }
}

/// Buyer address after placeholder substitution.
struct Destination {
    street: String,
    number: String,
    complement: Option<String>,
    district: String,
    municipality: String,
    state: String,
    placeholder_state: bool,
    postal_code: Option<String>,
}

impl Destination {
    fn from_customer(customer: &Customer) -> Self {
        let a = &customer.address;

        // City and UF travel together: a city without its state (or the
        // reverse) cannot be validated, so both fall back.
        let (municipality, state, placeholder_state) =
            match (non_blank(&a.municipality), non_blank(&a.state)) {
                (Some(city), Some(uf)) => (city.to_string(), uf.to_uppercase(), false),
                _ => (
                    PLACEHOLDER_MUNICIPALITY.to_string(),
                    PLACEHOLDER_STATE.to_string(),
                    true,
                ),
            };

        Self {
            street: non_blank(&a.street).unwrap_or(PLACEHOLDER_STREET).to_string(),
            number: non_blank(&a.number).unwrap_or(PLACEHOLDER_NUMBER).to_string(),
            complement: non_blank(&a.complement).map(str::to_string),
            district: non_blank(&a.district).unwrap_or(PLACEHOLDER_DISTRICT).to_string(),
            municipality,
            state,
            placeholder_state,
            postal_code: a.postal_code_digits(),
        }
    }
}

fn required(value: &Option<String>) -> String {
    non_blank(value).unwrap_or_default().to_string()
}

fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn format_emission_date(issued_at: DateTime<Utc>) -> String {
    match FixedOffset::west_opt(BRT_OFFSET_SECS) {
        Some(brt) => issued_at
            .with_timezone(&brt)
            .to_rfc3339_opts(SecondsFormat::Secs, false),
        None => issued_at.to_rfc3339_opts(SecondsFormat::Secs, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fiscoerp_core::{AggregateId, TenantId};
    use fiscoerp_parties::Address;
    use fiscoerp_sales::SaleId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_emitter() -> Emitter {
        Emitter {
            legal_name: "Oficina Exemplo LTDA".to_string(),
            trade_name: Some("Oficina Exemplo".to_string()),
            cnpj: TaxId::parse("11.222.333/0001-81").unwrap(),
            state_registration: "123456789".to_string(),
            municipal_registration: None,
            address: Address {
                street: Some("Rua das Flores".to_string()),
                number: Some("100".to_string()),
                complement: None,
                district: Some("Centro".to_string()),
                municipality: Some("Campinas".to_string()),
                state: Some("SP".to_string()),
                postal_code: Some("13010-000".to_string()),
            },
            phone: Some("(19) 3232-0000".to_string()),
        }
    }

    fn item(code: &str, quantity: Decimal, unit_value: Decimal) -> SaleItem {
        SaleItem {
            product_code: code.to_string(),
            description: format!("Produto {code}"),
            ncm: None,
            cfop: None,
            unit: "un".to_string(),
            quantity,
            unit_value,
            gross_value: None,
        }
    }

    fn test_sale(customer: Customer, items: Vec<SaleItem>) -> Sale {
        let products = items
            .iter()
            .filter_map(SaleItem::computed_gross)
            .fold(Decimal::ZERO, |acc, gross| acc.saturating_add(gross));
        Sale {
            id: SaleId::new(AggregateId::new()),
            tenant_id: TenantId::new(),
            customer,
            items,
            freight: Decimal::ZERO,
            insurance: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: products,
            notes: None,
            issued_at: Utc.with_ymd_and_hms(2026, 10, 15, 15, 30, 0).unwrap(),
        }
    }

    fn full_customer() -> Customer {
        Customer::new("Maria Silva")
            .with_tax_id(TaxId::parse("529.982.247-25").unwrap())
            .with_address(Address {
                street: Some("Av. Brasil".to_string()),
                number: Some("42".to_string()),
                complement: Some("Apto 3".to_string()),
                district: Some("Jardim".to_string()),
                municipality: Some("Campinas".to_string()),
                state: Some("sp".to_string()),
                postal_code: Some("13020-000".to_string()),
            })
    }

    #[test]
    fn fixed_nature_type_and_purpose() {
        let sale = test_sale(full_customer(), vec![item("A", dec!(1), dec!(350.00))]);
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

        assert_eq!(doc.natureza_operacao, "Venda");
        assert_eq!(doc.tipo_documento, TIPO_DOCUMENTO_SAIDA);
        assert_eq!(doc.finalidade_emissao, FINALIDADE_NORMAL);
        assert_eq!(doc.data_emissao, "2026-10-15T12:30:00-03:00");
        assert_eq!(doc.cnpj_emitente, "11222333000181");
        assert_eq!(doc.cep_emitente, "13010000");
        assert_eq!(doc.telefone_emitente.as_deref(), Some("1932320000"));
        assert_eq!(doc.cpf_destinatario.as_deref(), Some("52998224725"));
        assert_eq!(doc.cnpj_destinatario, None);
        assert_eq!(doc.uf_destinatario, "SP");
        assert_eq!(doc.local_destino, LOCAL_DESTINO_INTERNA);
        assert_eq!(doc.consumidor_final, 1);
        assert_eq!(doc.modalidade_frete, MODALIDADE_FRETE_SEM_FRETE);
        assert_eq!(doc.valor_total, "350.00");
        assert_eq!(doc.valor_produtos, "350.00");
    }

    #[test]
    fn items_keep_order_and_get_one_based_sequence() {
        let sale = test_sale(
            full_customer(),
            vec![
                item("A", dec!(1), dec!(10)),
                item("B", dec!(2), dec!(20)),
                item("C", dec!(3), dec!(30)),
            ],
        );
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

        let seq: Vec<(u32, &str)> = doc
            .items
            .iter()
            .map(|i| (i.numero_item, i.codigo_produto.as_str()))
            .collect();
        assert_eq!(seq, vec![(1, "A"), (2, "B"), (3, "C")]);
        assert_eq!(doc.items[1].valor_bruto, "40.00");
        assert_eq!(doc.items[1].quantidade_comercial, "2.0000");
        assert_eq!(doc.items[1].unidade_comercial, "UN");
    }

    #[test]
    fn tax_codes_are_simples_nacional_constants() {
        let sale = test_sale(full_customer(), vec![item("A", dec!(1), dec!(5))]);
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();
        let it = &doc.items[0];
        assert_eq!(doc.regime_tributario_emitente, REGIME_SIMPLES_NACIONAL);
        assert_eq!(it.icms_origem, "0");
        assert_eq!(it.icms_situacao_tributaria, "102");
        assert_eq!(it.pis_situacao_tributaria, "07");
        assert_eq!(it.cofins_situacao_tributaria, "07");
        assert_eq!(it.cfop, CFOP_VENDA_INTERNA);
        assert_eq!(it.codigo_ncm, NCM_GENERICO);
    }

    #[test]
    fn missing_buyer_address_gets_placeholders() {
        let sale = test_sale(Customer::new("Consumidor"), vec![item("A", dec!(1), dec!(5))]);
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

        assert_eq!(doc.logradouro_destinatario, "Não informado");
        assert_eq!(doc.numero_destinatario, "S/N");
        assert_eq!(doc.bairro_destinatario, "Não informado");
        assert_eq!(doc.municipio_destinatario, PLACEHOLDER_MUNICIPALITY);
        assert_eq!(doc.uf_destinatario, PLACEHOLDER_STATE);
        assert_eq!(doc.cep_destinatario, None);
        assert_eq!(doc.cpf_destinatario, None);
        assert_eq!(doc.cnpj_destinatario, None);
        assert_eq!(doc.indicador_inscricao_estadual_destinatario, IE_NAO_CONTRIBUINTE);
    }

    #[test]
    fn city_without_state_falls_back_as_a_pair() {
        let customer = Customer::new("Joao").with_address(Address {
            municipality: Some("Recife".to_string()),
            ..Address::default()
        });
        let sale = test_sale(customer, vec![item("A", dec!(1), dec!(5))]);
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();
        assert_eq!(doc.municipio_destinatario, PLACEHOLDER_MUNICIPALITY);
        assert_eq!(doc.uf_destinatario, PLACEHOLDER_STATE);
    }

    #[test]
    fn placeholder_state_never_makes_a_sale_interstate() {
        let mut emitter = test_emitter();
        emitter.address.municipality = Some("Recife".to_string());
        emitter.address.state = Some("PE".to_string());
        let sale = test_sale(Customer::new("Consumidor"), vec![item("A", dec!(1), dec!(5))]);
        let doc = map_sale_to_document(&sale, &emitter).unwrap();

        assert_eq!(doc.uf_destinatario, PLACEHOLDER_STATE);
        assert_eq!(doc.local_destino, LOCAL_DESTINO_INTERNA);
        assert_eq!(doc.items[0].cfop, CFOP_VENDA_INTERNA);
    }

    #[test]
    fn overflowing_item_value_is_a_validation_error() {
        let huge = item("A", dec!(1000000000000000), dec!(1000000000000000));
        let mut sale = test_sale(full_customer(), vec![huge]);
        sale.total = dec!(1);
        let err = map_sale_to_document(&sale, &test_emitter()).unwrap_err();
        assert_eq!(err, DomainError::validation("item 1: value out of range"));
    }

    #[test]
    fn overflowing_sale_total_is_a_validation_error() {
        let mut sale = test_sale(full_customer(), vec![item("A", dec!(1), dec!(1))]);
        sale.freight = Decimal::MAX;
        sale.total = dec!(1);
        let err = map_sale_to_document(&sale, &test_emitter()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("out of range")));
    }

    #[test]
    fn out_of_state_buyer_uses_interstate_cfop() {
        let customer = Customer::new("Empresa PE")
            .with_tax_id(TaxId::parse("11.222.333/0001-81").unwrap())
            .with_address(Address {
                municipality: Some("Recife".to_string()),
                state: Some("PE".to_string()),
                ..Address::default()
            });
        let mut sale = test_sale(customer, vec![item("A", dec!(1), dec!(5))]);
        sale.customer.state_registration = Some("0321418-40".to_string());
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

        assert_eq!(doc.local_destino, LOCAL_DESTINO_INTERESTADUAL);
        assert_eq!(doc.items[0].cfop, CFOP_VENDA_INTERESTADUAL);
        assert_eq!(doc.cnpj_destinatario.as_deref(), Some("11222333000181"));
        assert_eq!(doc.indicador_inscricao_estadual_destinatario, IE_CONTRIBUINTE);
        assert_eq!(doc.consumidor_final, 0);
    }

    #[test]
    fn freight_and_discount_flow_into_totals() {
        let mut sale = test_sale(full_customer(), vec![item("A", dec!(2), dec!(50))]);
        sale.freight = dec!(20);
        sale.insurance = dec!(1.5);
        sale.discount = dec!(10);
        sale.total = dec!(111.50);
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

        assert_eq!(doc.valor_produtos, "100.00");
        assert_eq!(doc.valor_frete, "20.00");
        assert_eq!(doc.valor_seguro, "1.50");
        assert_eq!(doc.valor_desconto, "10.00");
        assert_eq!(doc.valor_total, "111.50");
        assert_eq!(doc.modalidade_frete, MODALIDADE_FRETE_EMITENTE);
    }

    #[test]
    fn mismatched_total_is_rejected() {
        let mut sale = test_sale(full_customer(), vec![item("A", dec!(1), dec!(10))]);
        sale.total = dec!(11);
        let err = map_sale_to_document(&sale, &test_emitter()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("sale total")));
    }

    #[test]
    fn declared_gross_must_match_quantity_times_unit() {
        let mut bad = item("A", dec!(3), dec!(10));
        bad.gross_value = Some(dec!(31));
        let mut sale = test_sale(full_customer(), vec![bad]);
        sale.total = dec!(30);
        let err = map_sale_to_document(&sale, &test_emitter()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("item 1: gross value")));
    }

    #[test]
    fn empty_sale_and_bad_quantities_are_rejected() {
        let sale = test_sale(full_customer(), vec![]);
        assert!(matches!(
            map_sale_to_document(&sale, &test_emitter()),
            Err(DomainError::Validation(_))
        ));

        let sale = test_sale(full_customer(), vec![item("A", dec!(0), dec!(1))]);
        assert!(matches!(
            map_sale_to_document(&sale, &test_emitter()),
            Err(DomainError::Validation(msg)) if msg.contains("quantity")
        ));
    }

    #[test]
    fn incomplete_emitter_blocks_mapping() {
        let mut emitter = test_emitter();
        emitter.address.street = None;
        let sale = test_sale(full_customer(), vec![item("A", dec!(1), dec!(1))]);
        assert!(matches!(
            map_sale_to_document(&sale, &emitter),
            Err(DomainError::Validation(msg)) if msg.contains("address.street")
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: mapping is referentially transparent (byte-identical JSON).
        #[test]
        fn mapping_is_idempotent(
            lines in prop::collection::vec((1i64..1_000i64, 1i64..10_000_000i64), 1..8)
        ) {
            let items = lines
                .iter()
                .enumerate()
                .map(|(i, (q, cents))| {
                    item(&format!("P{i}"), Decimal::from(*q), Decimal::new(*cents, 2))
                })
                .collect();
            let sale = test_sale(full_customer(), items);
            let emitter = test_emitter();

            let first = map_sale_to_document(&sale, &emitter).unwrap();
            let second = map_sale_to_document(&sale, &emitter).unwrap();
            let first = serde_json::to_vec(&first).unwrap();
            let second = serde_json::to_vec(&second).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: any cent-precise total is rendered exactly as typed.
        #[test]
        fn totals_render_without_float_artifacts(cents in 1i64..100_000_000i64) {
            let value = Decimal::new(cents, 2);
            let sale = test_sale(full_customer(), vec![item("A", Decimal::ONE, value)]);
            let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

            let expected = format!("{}.{:02}", cents / 100, cents % 100);
            prop_assert_eq!(&doc.valor_total, &expected);
            prop_assert_eq!(&doc.items[0].valor_bruto, &expected);
        }

        /// Property: sequence numbers are 1..=n in input order.
        #[test]
        fn sequence_numbers_follow_input_order(n in 1usize..20) {
            let items = (0..n)
                .map(|i| item(&format!("P{i}"), Decimal::ONE, Decimal::ONE))
                .collect();
            let sale = test_sale(full_customer(), items);
            let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();

            for (i, it) in doc.items.iter().enumerate() {
                prop_assert_eq!(it.numero_item as usize, i + 1);
                prop_assert_eq!(&it.codigo_produto, &format!("P{i}"));
            }
        }
    }

    #[test]
    fn decimal_fidelity_for_1234_56() {
        let sale = test_sale(full_customer(), vec![item("A", dec!(1), dec!(1234.56))]);
        let doc = map_sale_to_document(&sale, &test_emitter()).unwrap();
        assert_eq!(doc.valor_total, "1234.56");
        assert_eq!(doc.items[0].valor_unitario_comercial, "1234.5600");
    }
}
