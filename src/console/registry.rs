//! String-keyed command registry with overloads
//!
//! One id can carry several handlers as long as their parameter type lists
//! differ. Dispatch picks the first overload (in registration order) whose
//! parameters accept the given arguments; an overload with the exact arity is
//! preferred over one that would ignore trailing arguments.

use std::collections::HashMap;

use bevy::prelude::*;

use super::command::{ArgValue, CommandArgs, CommandOutput, ParamSpec, ParamType};
use crate::error::DispatchError;

pub type CommandHandler<Ctx> = Box<dyn Fn(&mut Ctx, &CommandArgs) -> CommandOutput + Send + Sync>;

struct RegisteredCommand<Ctx> {
    description: String,
    params: Vec<ParamSpec>,
    handler: CommandHandler<Ctx>,
}

impl<Ctx> RegisteredCommand<Ctx> {
    fn signature(&self) -> Vec<ParamType> {
        self.params.iter().map(|p| p.param_type).collect()
    }

    fn usage(&self, id: &str) -> String {
        let mut usage = format!("Usage: {} ", id);
        for param in &self.params {
            usage.push_str(&param.name);
            usage.push(' ');
        }
        if !self.params.is_empty() {
            usage.push_str("\nParameter Info:\n");
            let info: Vec<String> = self
                .params
                .iter()
                .map(|p| format!("\t - {}: {}", p.name, p.param_type.alias()))
                .collect();
            usage.push_str(&info.join("\n"));
        }
        usage
    }

    fn parse_args(&self, args: &[&str]) -> Option<CommandArgs> {
        if args.len() < self.params.len() {
            return None;
        }
        let values: Option<Vec<ArgValue>> = self
            .params
            .iter()
            .zip(args)
            .map(|(param, raw)| param.param_type.parse(raw))
            .collect();
        values.map(CommandArgs::new)
    }
}

pub struct CommandRegistry<Ctx> {
    commands: HashMap<String, Vec<RegisteredCommand<Ctx>>>,
    order: Vec<String>,
}

impl<Ctx> Default for CommandRegistry<Ctx> {
    fn default() -> Self {
        Self {
            commands: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<Ctx> std::fmt::Debug for CommandRegistry<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("ids", &self.order)
            .finish()
    }
}

impl<Ctx> CommandRegistry<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Returns false (and keeps the existing handler) when
    /// `id` already has an overload with the same parameter types.
    pub fn register<F, O>(
        &mut self,
        id: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: F,
    ) -> bool
    where
        F: Fn(&mut Ctx, &CommandArgs) -> O + Send + Sync + 'static,
        O: Into<CommandOutput>,
    {
        let id = id.into();
        let command = RegisteredCommand {
            description: description.into(),
            params,
            handler: Box::new(move |ctx, args| handler(ctx, args).into()),
        };

        let overloads = self.commands.entry(id.clone()).or_default();
        let signature = command.signature();
        if overloads.iter().any(|c| c.signature() == signature) {
            warn!(
                "Command Signature Collision with Id: {}. Latest Command will be ignored.",
                id
            );
            return false;
        }
        if overloads.is_empty() {
            self.order.push(id.clone());
        }
        overloads.push(command);
        debug!("Registered console command '{}'", id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    /// Parse `args` against the overloads of `id` and run the first match.
    pub fn invoke(
        &self,
        ctx: &mut Ctx,
        id: &str,
        args: &[&str],
    ) -> Result<CommandOutput, DispatchError> {
        let overloads = self
            .commands
            .get(id)
            .ok_or_else(|| DispatchError::UnknownCommand(id.to_string()))?;

        let exact = overloads.iter().filter(|c| c.params.len() == args.len());
        let lenient = overloads.iter().filter(|c| c.params.len() < args.len());
        for command in exact.chain(lenient) {
            if let Some(parsed) = command.parse_args(args) {
                return Ok((command.handler)(ctx, &parsed));
            }
        }

        Err(DispatchError::BadArguments {
            id: id.to_string(),
            usage: self.usage(id).unwrap_or_default(),
        })
    }

    /// Usage text for every overload of `id`, one block per overload.
    pub fn usage(&self, id: &str) -> Option<String> {
        let overloads = self.commands.get(id)?;
        let blocks: Vec<String> = overloads.iter().map(|c| c.usage(id)).collect();
        Some(blocks.join("\n"))
    }

    /// Ids in registration order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// `(id, description)` per id, in registration order.
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.order
            .iter()
            .filter_map(|id| {
                let first = self.commands.get(id)?.first()?;
                Some((id.as_str(), first.description.as_str()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
