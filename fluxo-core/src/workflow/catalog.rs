//! Built-in workflow catalog
//!
//! The solicitation flows of the school meal program, declared as data.
//! State names and labels follow the wording the program's operators
//! see, so audit output matches the paper process.

use crate::models::actor::Actor;
use crate::models::record::SolicitationRecord;
use crate::models::workflow::{
    State, StateDecl, Transition, TransitionPayload, WorkflowDefinition,
};
use crate::workflow::registry::{RegistryError, WorkflowRegistry};

// Capability names, one per operator role
pub const DIRETOR_UE: &str = "DIRETOR_UE";
pub const COGESTOR_DRE: &str = "COGESTOR_DRE";
pub const COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA: &str =
    "COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA";
pub const COORDENADOR_DIETA_ESPECIAL: &str = "COORDENADOR_DIETA_ESPECIAL";
pub const ADMINISTRADOR_EMPRESA: &str = "ADMINISTRADOR_EMPRESA";
pub const USUARIO_EMPRESA: &str = "USUARIO_EMPRESA";
pub const DILOG_CRONOGRAMA: &str = "DILOG_CRONOGRAMA";
pub const DILOG_ABASTECIMENTO: &str = "DILOG_ABASTECIMENTO";

fn requires_justification(
    _record: &SolicitationRecord,
    _actor: &dyn Actor,
    payload: &TransitionPayload,
) -> Result<(), String> {
    if payload.has_justification() {
        Ok(())
    } else {
        Err("justificativa obrigatória".to_string())
    }
}

fn requires_acknowledgment(
    _record: &SolicitationRecord,
    _actor: &dyn Actor,
    payload: &TransitionPayload,
) -> Result<(), String> {
    if payload.acknowledgment.is_some() {
        Ok(())
    } else {
        Err("resposta sim/não obrigatória".to_string())
    }
}

/// Meal request opened by a school, validated by its DRE and decided by CODAE
pub fn pedido_a_partir_da_escola() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "PedidoAPartirDaEscola".to_string(),
        description: Some(
            "Meal request opened by a school, validated by the DRE and decided by CODAE"
                .to_string(),
        ),
        states: vec![
            StateDecl::new("RASCUNHO", "Rascunho"),
            StateDecl::new("DRE_A_VALIDAR", "DRE a validar"),
            StateDecl::new("DRE_VALIDADO", "DRE validado"),
            StateDecl::new("DRE_PEDIU_ESCOLA_REVISAR", "Escola tem que revisar o pedido"),
            StateDecl::new(
                "DRE_NAO_VALIDOU_PEDIDO_ESCOLA",
                "DRE não validou pedido da escola",
            ),
            StateDecl::new("CODAE_AUTORIZADO", "CODAE autorizou pedido"),
            StateDecl::new(
                "CODAE_QUESTIONADO",
                "CODAE questionou terceirizada se é possível atender a solicitação",
            ),
            StateDecl::new("CODAE_NEGOU_PEDIDO", "CODAE negou pedido"),
            StateDecl::new(
                "TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO",
                "Terceirizada respondeu se é possível atender a solicitação",
            ),
            StateDecl::new("TERCEIRIZADA_TOMOU_CIENCIA", "Terceirizada tomou ciência"),
            StateDecl::new("ESCOLA_CANCELOU", "Escola cancelou"),
        ],
        initial_state: State::from("RASCUNHO"),
        terminal_states: vec![
            State::from("DRE_NAO_VALIDOU_PEDIDO_ESCOLA"),
            State::from("CODAE_NEGOU_PEDIDO"),
            State::from("TERCEIRIZADA_TOMOU_CIENCIA"),
            State::from("ESCOLA_CANCELOU"),
        ],
        transitions: vec![
            Transition::new("inicia_fluxo", &["RASCUNHO"], "DRE_A_VALIDAR", DIRETOR_UE),
            Transition::new("dre_valida", &["DRE_A_VALIDAR"], "DRE_VALIDADO", COGESTOR_DRE),
            Transition::new(
                "dre_pede_revisao",
                &["DRE_A_VALIDAR"],
                "DRE_PEDIU_ESCOLA_REVISAR",
                COGESTOR_DRE,
            ),
            Transition::new(
                "dre_nao_valida",
                &["DRE_A_VALIDAR"],
                "DRE_NAO_VALIDOU_PEDIDO_ESCOLA",
                COGESTOR_DRE,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "escola_revisa",
                &["DRE_PEDIU_ESCOLA_REVISAR"],
                "DRE_A_VALIDAR",
                DIRETOR_UE,
            ),
            Transition::new(
                "codae_autoriza",
                &["DRE_VALIDADO"],
                "CODAE_AUTORIZADO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_questiona",
                &["DRE_VALIDADO"],
                "CODAE_QUESTIONADO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_autoriza_questionamento",
                &["DRE_VALIDADO", "TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO"],
                "CODAE_AUTORIZADO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_nega_questionamento",
                &["TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO"],
                "CODAE_NEGOU_PEDIDO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "codae_nega",
                &["DRE_VALIDADO", "CODAE_QUESTIONADO"],
                "CODAE_NEGOU_PEDIDO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "terceirizada_responde_questionamento",
                &["CODAE_QUESTIONADO"],
                "TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO",
                USUARIO_EMPRESA,
            )
            .with_precondition(requires_acknowledgment),
            Transition::new(
                "terceirizada_toma_ciencia",
                &["CODAE_AUTORIZADO"],
                "TERCEIRIZADA_TOMOU_CIENCIA",
                USUARIO_EMPRESA,
            ),
            Transition::new(
                "escola_cancela",
                &["DRE_A_VALIDAR", "DRE_VALIDADO", "DRE_PEDIU_ESCOLA_REVISAR"],
                "ESCOLA_CANCELOU",
                DIRETOR_UE,
            )
            .with_precondition(requires_justification),
        ],
    }
}

/// Meal request opened by a DRE and decided by CODAE
pub fn pedido_a_partir_da_dre() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "PedidoAPartirDaDre".to_string(),
        description: Some("Meal request opened by a DRE and decided by CODAE".to_string()),
        states: vec![
            StateDecl::new("RASCUNHO", "Rascunho"),
            StateDecl::new("CODAE_A_AUTORIZAR", "CODAE a autorizar"),
            StateDecl::new("CODAE_PEDIU_DRE_REVISAR", "DRE tem que revisar o pedido"),
            StateDecl::new("CODAE_NEGOU_PEDIDO", "CODAE negou o pedido da DRE"),
            StateDecl::new("CODAE_AUTORIZADO", "CODAE autorizou"),
            StateDecl::new(
                "CODAE_QUESTIONADO",
                "CODAE questionou terceirizada se é possível atender a solicitação",
            ),
            StateDecl::new("TERCEIRIZADA_TOMOU_CIENCIA", "Terceirizada tomou ciência"),
            StateDecl::new(
                "TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO",
                "Terceirizada respondeu se é possível atender a solicitação",
            ),
            StateDecl::new("DRE_CANCELOU", "DRE cancelou"),
        ],
        initial_state: State::from("RASCUNHO"),
        terminal_states: vec![
            State::from("CODAE_NEGOU_PEDIDO"),
            State::from("TERCEIRIZADA_TOMOU_CIENCIA"),
            State::from("DRE_CANCELOU"),
        ],
        transitions: vec![
            Transition::new("inicia_fluxo", &["RASCUNHO"], "CODAE_A_AUTORIZAR", COGESTOR_DRE),
            Transition::new(
                "codae_pede_revisao",
                &["CODAE_A_AUTORIZAR"],
                "CODAE_PEDIU_DRE_REVISAR",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_nega",
                &["CODAE_A_AUTORIZAR", "CODAE_QUESTIONADO"],
                "CODAE_NEGOU_PEDIDO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "dre_revisa",
                &["CODAE_PEDIU_DRE_REVISAR"],
                "CODAE_A_AUTORIZAR",
                COGESTOR_DRE,
            ),
            Transition::new(
                "codae_autoriza",
                &["CODAE_A_AUTORIZAR"],
                "CODAE_AUTORIZADO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_questiona",
                &["CODAE_A_AUTORIZAR"],
                "CODAE_QUESTIONADO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_autoriza_questionamento",
                &["TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO"],
                "CODAE_AUTORIZADO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            ),
            Transition::new(
                "codae_nega_questionamento",
                &["TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO"],
                "CODAE_NEGOU_PEDIDO",
                COORDENADOR_GESTAO_ALIMENTACAO_TERCEIRIZADA,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "terceirizada_toma_ciencia",
                &["CODAE_AUTORIZADO"],
                "TERCEIRIZADA_TOMOU_CIENCIA",
                USUARIO_EMPRESA,
            ),
            Transition::new(
                "terceirizada_responde_questionamento",
                &["CODAE_QUESTIONADO"],
                "TERCEIRIZADA_RESPONDEU_QUESTIONAMENTO",
                USUARIO_EMPRESA,
            )
            .with_precondition(requires_acknowledgment),
            Transition::new(
                "dre_cancela",
                &["CODAE_A_AUTORIZAR", "CODAE_PEDIU_DRE_REVISAR"],
                "DRE_CANCELOU",
                COGESTOR_DRE,
            )
            .with_precondition(requires_justification),
        ],
    }
}

/// Notice sent by a school, acknowledged by the meal provider
pub fn informativo_partindo_da_escola() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "InformativoPartindoDaEscola".to_string(),
        description: Some("Notice sent by a school, acknowledged by the meal provider".to_string()),
        states: vec![
            StateDecl::new("RASCUNHO", "Rascunho"),
            StateDecl::new("INFORMADO", "Informado"),
            StateDecl::new("TERCEIRIZADA_TOMOU_CIENCIA", "Terceirizada tomou ciência"),
            StateDecl::new("ESCOLA_CANCELOU", "Escola cancelou"),
        ],
        initial_state: State::from("RASCUNHO"),
        terminal_states: vec![State::from("ESCOLA_CANCELOU")],
        transitions: vec![
            Transition::new("informa", &["RASCUNHO"], "INFORMADO", DIRETOR_UE),
            Transition::new(
                "terceirizada_toma_ciencia",
                &["INFORMADO"],
                "TERCEIRIZADA_TOMOU_CIENCIA",
                USUARIO_EMPRESA,
            ),
            // The school may withdraw even after the provider acknowledged
            Transition::new(
                "escola_cancela",
                &["INFORMADO", "TERCEIRIZADA_TOMOU_CIENCIA"],
                "ESCOLA_CANCELOU",
                DIRETOR_UE,
            )
            .with_precondition(requires_justification),
        ],
    }
}

/// Special diet request, including the later inactivation flow
pub fn dieta_especial() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "DietaEspecial".to_string(),
        description: Some(
            "Special diet request, including the later inactivation flow".to_string(),
        ),
        states: vec![
            StateDecl::new("RASCUNHO", "Rascunho"),
            StateDecl::new("CODAE_A_AUTORIZAR", "CODAE a autorizar"),
            StateDecl::new("CODAE_NEGOU_PEDIDO", "CODAE negou a solicitação"),
            StateDecl::new("CODAE_AUTORIZADO", "CODAE autorizou"),
            StateDecl::new("TERCEIRIZADA_TOMOU_CIENCIA", "Terceirizada tomou ciência"),
            StateDecl::new("ESCOLA_SOLICITOU_INATIVACAO", "Escola solicitou cancelamento"),
            StateDecl::new("CODAE_NEGOU_INATIVACAO", "CODAE negou o cancelamento"),
            StateDecl::new("CODAE_AUTORIZOU_INATIVACAO", "CODAE autorizou o cancelamento"),
            StateDecl::new(
                "TERCEIRIZADA_TOMOU_CIENCIA_INATIVACAO",
                "Terceirizada tomou ciência do cancelamento",
            ),
            StateDecl::new("ESCOLA_CANCELOU", "Escola cancelou"),
        ],
        initial_state: State::from("RASCUNHO"),
        terminal_states: vec![
            State::from("CODAE_NEGOU_PEDIDO"),
            State::from("ESCOLA_CANCELOU"),
            State::from("CODAE_NEGOU_INATIVACAO"),
            State::from("TERCEIRIZADA_TOMOU_CIENCIA_INATIVACAO"),
        ],
        transitions: vec![
            Transition::new("inicia_fluxo", &["RASCUNHO"], "CODAE_A_AUTORIZAR", DIRETOR_UE),
            Transition::new(
                "codae_nega",
                &["CODAE_A_AUTORIZAR"],
                "CODAE_NEGOU_PEDIDO",
                COORDENADOR_DIETA_ESPECIAL,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "codae_autoriza",
                &["RASCUNHO", "CODAE_A_AUTORIZAR"],
                "CODAE_AUTORIZADO",
                COORDENADOR_DIETA_ESPECIAL,
            ),
            Transition::new(
                "terceirizada_toma_ciencia",
                &["CODAE_AUTORIZADO"],
                "TERCEIRIZADA_TOMOU_CIENCIA",
                USUARIO_EMPRESA,
            ),
            Transition::new(
                "cancelar_pedido",
                &["CODAE_A_AUTORIZAR", "ESCOLA_SOLICITOU_INATIVACAO", "CODAE_AUTORIZADO"],
                "ESCOLA_CANCELOU",
                DIRETOR_UE,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "inicia_fluxo_inativacao",
                &["RASCUNHO", "CODAE_AUTORIZADO", "TERCEIRIZADA_TOMOU_CIENCIA"],
                "ESCOLA_SOLICITOU_INATIVACAO",
                DIRETOR_UE,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "codae_nega_inativacao",
                &["ESCOLA_SOLICITOU_INATIVACAO"],
                "CODAE_NEGOU_INATIVACAO",
                COORDENADOR_DIETA_ESPECIAL,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "codae_autoriza_inativacao",
                &["ESCOLA_SOLICITOU_INATIVACAO"],
                "CODAE_AUTORIZOU_INATIVACAO",
                COORDENADOR_DIETA_ESPECIAL,
            ),
            Transition::new(
                "terceirizada_toma_ciencia_inativacao",
                &["CODAE_AUTORIZOU_INATIVACAO"],
                "TERCEIRIZADA_TOMOU_CIENCIA_INATIVACAO",
                USUARIO_EMPRESA,
            ),
        ],
    }
}

/// Delivery schedule signed in turn by supplier, DILOG and CODAE.
/// Signed schedules can always be amended, so the flow has no terminal
/// states.
pub fn cronograma() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "Cronograma".to_string(),
        description: Some(
            "Delivery schedule signed in turn by supplier, DILOG and CODAE".to_string(),
        ),
        states: vec![
            StateDecl::new("RASCUNHO", "Rascunho"),
            StateDecl::new(
                "ASSINADO_E_ENVIADO_AO_FORNECEDOR",
                "Assinado e Enviado ao Fornecedor",
            ),
            StateDecl::new("ALTERACAO_CODAE", "Alteração CODAE"),
            StateDecl::new("ASSINADO_FORNECEDOR", "Assinado Fornecedor"),
            StateDecl::new("SOLICITADO_ALTERACAO", "Solicitado Alteração"),
            StateDecl::new("ASSINADO_DILOG_ABASTECIMENTO", "Assinado Abastecimento"),
            StateDecl::new("ASSINADO_CODAE", "Assinado CODAE"),
        ],
        initial_state: State::from("RASCUNHO"),
        terminal_states: vec![],
        transitions: vec![
            Transition::new(
                "inicia_fluxo",
                &["RASCUNHO"],
                "ASSINADO_E_ENVIADO_AO_FORNECEDOR",
                DILOG_CRONOGRAMA,
            ),
            Transition::new(
                "fornecedor_assina",
                &["ASSINADO_E_ENVIADO_AO_FORNECEDOR"],
                "ASSINADO_FORNECEDOR",
                USUARIO_EMPRESA,
            ),
            Transition::new(
                "dilog_abastecimento_assina",
                &["ASSINADO_FORNECEDOR"],
                "ASSINADO_DILOG_ABASTECIMENTO",
                DILOG_ABASTECIMENTO,
            ),
            Transition::new(
                "codae_assina",
                &["ASSINADO_DILOG_ABASTECIMENTO"],
                "ASSINADO_CODAE",
                DILOG_CRONOGRAMA,
            ),
            Transition::new(
                "fornecedor_solicita_alteracao",
                &["ASSINADO_CODAE"],
                "SOLICITADO_ALTERACAO",
                USUARIO_EMPRESA,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "codae_realiza_alteracao",
                &["ASSINADO_CODAE"],
                "ALTERACAO_CODAE",
                DILOG_CRONOGRAMA,
            ),
            Transition::new(
                "finaliza_solicitacao_alteracao",
                &["SOLICITADO_ALTERACAO", "ALTERACAO_CODAE"],
                "ASSINADO_CODAE",
                DILOG_CRONOGRAMA,
            ),
        ],
    }
}

/// Shipment request sent by DILOG to a distributor.
/// Cancellation is declared from CANCELADA itself, so cancelling an
/// already cancelled shipment commits again instead of failing.
pub fn solicitacao_remessa() -> WorkflowDefinition {
    WorkflowDefinition {
        kind: "SolicitacaoRemessa".to_string(),
        description: Some("Shipment request sent by DILOG to a distributor".to_string()),
        states: vec![
            StateDecl::new("AGUARDANDO_ENVIO", "Aguardando envio"),
            StateDecl::new("DILOG_ENVIA", "Enviada"),
            StateDecl::new("AGUARDANDO_CANCELAMENTO", "Aguardando cancelamento"),
            StateDecl::new("CANCELADA", "Cancelada"),
            StateDecl::new("DISTRIBUIDOR_CONFIRMA", "Confirmada"),
            StateDecl::new("DISTRIBUIDOR_SOLICITA_ALTERACAO", "Em análise"),
            StateDecl::new("DILOG_ACEITA_ALTERACAO", "Alterada"),
        ],
        initial_state: State::from("AGUARDANDO_ENVIO"),
        terminal_states: vec![],
        transitions: vec![
            Transition::new(
                "inicia_fluxo",
                &["AGUARDANDO_ENVIO"],
                "DILOG_ENVIA",
                DILOG_ABASTECIMENTO,
            ),
            Transition::new(
                "empresa_atende",
                &["DILOG_ENVIA"],
                "DISTRIBUIDOR_CONFIRMA",
                ADMINISTRADOR_EMPRESA,
            ),
            Transition::new(
                "solicita_alteracao",
                &["DILOG_ENVIA"],
                "DISTRIBUIDOR_SOLICITA_ALTERACAO",
                ADMINISTRADOR_EMPRESA,
            )
            .with_precondition(requires_justification),
            Transition::new(
                "cancela_solicitacao",
                &[
                    "AGUARDANDO_ENVIO",
                    "DILOG_ENVIA",
                    "DISTRIBUIDOR_CONFIRMA",
                    "DISTRIBUIDOR_SOLICITA_ALTERACAO",
                    "CANCELADA",
                    "DILOG_ACEITA_ALTERACAO",
                ],
                "CANCELADA",
                DILOG_ABASTECIMENTO,
            ),
            Transition::new(
                "dilog_aceita_alteracao",
                &["DISTRIBUIDOR_SOLICITA_ALTERACAO"],
                "DILOG_ACEITA_ALTERACAO",
                DILOG_ABASTECIMENTO,
            ),
            Transition::new(
                "dilog_nega_alteracao",
                &["DISTRIBUIDOR_SOLICITA_ALTERACAO"],
                "DILOG_ENVIA",
                DILOG_ABASTECIMENTO,
            ),
            Transition::new(
                "aguarda_confirmacao_de_cancelamento",
                &["DISTRIBUIDOR_CONFIRMA", "DISTRIBUIDOR_SOLICITA_ALTERACAO"],
                "AGUARDANDO_CANCELAMENTO",
                DILOG_ABASTECIMENTO,
            ),
            Transition::new(
                "distribuidor_confirma_cancelamento",
                &["AGUARDANDO_CANCELAMENTO"],
                "CANCELADA",
                ADMINISTRADOR_EMPRESA,
            ),
        ],
    }
}

/// Registry preloaded with every built-in definition
pub fn builtin_registry() -> Result<WorkflowRegistry, RegistryError> {
    let mut registry = WorkflowRegistry::new();
    registry.register(pedido_a_partir_da_escola())?;
    registry.register(pedido_a_partir_da_dre())?;
    registry.register(informativo_partindo_da_escola())?;
    registry.register(dieta_especial())?;
    registry.register(cronograma())?;
    registry.register(solicitacao_remessa())?;
    Ok(registry)
}
