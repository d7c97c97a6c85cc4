//! Root flow: pick a resource type, create it, offer to go again

use futures::future::BoxFuture;

use crate::utils::errors::Result;
use super::flow::{FlowDefinition, StepContext, StepOutcome};
use super::prompt::Prompt;
use super::resource_group::RESOURCE_GROUP_DIALOG;
use super::storage_account::STORAGE_ACCOUNT_DIALOG;

pub const RESOURCE_DIALOG: &str = "resource";

pub const RESOURCE_TYPE_GROUP: &str = "resource group";
pub const RESOURCE_TYPE_STORAGE: &str = "storage account";

pub fn resource_flow() -> FlowDefinition {
    FlowDefinition::new(RESOURCE_DIALOG)
        .step("resource_type", resource_type_step)
        .step("create_resource", create_resource_step)
        .step("ask_to_continue", ask_to_continue_step)
        .step("continue_or_not", continue_or_not_step)
}

fn resource_type_step(_ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        Ok(StepOutcome::Prompt(Prompt::choice(
            "Please enter the resource type you wish to create.",
            vec![RESOURCE_TYPE_GROUP.to_string(), RESOURCE_TYPE_STORAGE.to_string()],
        )))
    })
}

fn create_resource_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let resource_type = ctx.result_text()?;
        ctx.set_value("resource_type", resource_type.clone());

        match resource_type.as_str() {
            RESOURCE_TYPE_GROUP => Ok(StepOutcome::BeginChild(RESOURCE_GROUP_DIALOG.to_string())),
            RESOURCE_TYPE_STORAGE => Ok(StepOutcome::BeginChild(STORAGE_ACCOUNT_DIALOG.to_string())),
            other => {
                ctx.send(format!("Unable to find resource type {}", other));
                Ok(StepOutcome::EndDialog(None))
            }
        }
    })
}

fn ask_to_continue_step(_ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        Ok(StepOutcome::Prompt(Prompt::choice(
            "Would you like to create another resource?",
            vec!["Yes".to_string(), "No".to_string()],
        )))
    })
}

fn continue_or_not_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let answer = ctx.result_text()?;
        if answer.eq_ignore_ascii_case("yes") {
            return Ok(StepOutcome::ReplaceDialog(RESOURCE_DIALOG.to_string()));
        }

        ctx.send("Goodbye!");
        Ok(StepOutcome::EndDialog(None))
    })
}
