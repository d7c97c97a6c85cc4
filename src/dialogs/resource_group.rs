//! Resource group flow: name, location, create

use std::time::Instant;
use futures::future::BoxFuture;

use crate::state::FrameValue;
use crate::utils::errors::Result;
use crate::utils::logging::log_provider_call;
use super::flow::{FlowDefinition, StepContext, StepOutcome};
use super::prompt::{Prompt, TextValidation};

pub const RESOURCE_GROUP_DIALOG: &str = "resource_group";

pub fn resource_group_flow() -> FlowDefinition {
    FlowDefinition::new(RESOURCE_GROUP_DIALOG)
        .step("name", name_step)
        .step("location", location_step)
        .step("create", create_step)
}

fn name_step(_ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        Ok(StepOutcome::Prompt(Prompt::validated_text(
            "Please enter the resource group name.",
            TextValidation::resource_group_name(),
        )))
    })
}

fn location_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let name = ctx.result_text()?;
        ctx.set_value("name", name);

        Ok(StepOutcome::Prompt(Prompt::choice(
            "Please enter the azure location.",
            ctx.options().locations.clone(),
        )))
    })
}

fn create_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let location = ctx.result_text()?;
        ctx.set_value("location", location.clone());
        let name = ctx.value_text("name")?;

        ctx.send(format!("Creating Resource Group {} in {}", name, location));

        let started = Instant::now();
        let created = ctx.provider().create_resource_group(&name, &location).await;
        log_provider_call(
            "create_resource_group",
            &name,
            started.elapsed().as_millis() as u64,
            created.is_ok(),
        );

        // Success or not, the sub-dialog ends here
        match created {
            Ok(handle) => {
                ctx.send(format!("Resource Group {} created as {}", name, handle.id));
                Ok(StepOutcome::EndDialog(Some(FrameValue::from(handle.id))))
            }
            Err(e) => {
                ctx.send(format!(
                    "An error occurred creating resource group {}. Message {}",
                    name, e
                ));
                Ok(StepOutcome::EndDialog(None))
            }
        }
    })
}
