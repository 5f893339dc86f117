//! Leaf nodes.

use bevy::prelude::*;

use super::node::{Behaviour, NodeState, TickContext};

/// Runs until `duration` seconds of tick time have accumulated.
pub struct Wait {
    duration: f32,
    elapsed: f32,
}

impl Wait {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
    }
}

impl Behaviour for Wait {
    fn name(&self) -> &str {
        "Wait"
    }

    fn on_start(&mut self) {
        self.elapsed = 0.0;
    }

    fn on_finish(&mut self) {
        self.elapsed = 0.0;
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        self.elapsed += ctx.delta_time;
        if self.elapsed >= self.duration {
            NodeState::Success
        } else {
            NodeState::Running
        }
    }
}

/// Logs a message and succeeds.
pub struct DebugLog {
    message: String,
}

impl DebugLog {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Behaviour for DebugLog {
    fn name(&self) -> &str {
        "DebugLog"
    }

    fn evaluate(&mut self, _ctx: &mut TickContext) -> NodeState {
        info!("[tree] {}", self.message);
        NodeState::Success
    }
}

/// Succeeds when a boolean blackboard property is `true`.
///
/// A missing or non-bool property counts as `false`.
pub struct CheckFlag {
    key: String,
}

impl CheckFlag {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Behaviour for CheckFlag {
    fn name(&self) -> &str {
        "CheckFlag"
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        match ctx.blackboard.try_get::<bool>(&self.key) {
            Some(true) => NodeState::Success,
            _ => NodeState::Failure,
        }
    }
}

/// Writes a boolean blackboard property and succeeds.
pub struct SetFlag {
    key: String,
    value: bool,
}

impl SetFlag {
    pub fn new(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl Behaviour for SetFlag {
    fn name(&self) -> &str {
        "SetFlag"
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        ctx.blackboard.set(self.key.clone(), self.value);
        NodeState::Success
    }
}

/// Closure-backed action for host logic that doesn't warrant its own type.
pub struct FnAction<F> {
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: FnMut(&mut TickContext) -> NodeState + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Behaviour for FnAction<F>
where
    F: FnMut(&mut TickContext) -> NodeState + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        (self.func)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour_tree::blackboard::Blackboard;
    use crate::behaviour_tree::node::BtNode;

    fn tick(node: &mut BtNode, blackboard: &mut Blackboard, dt: f32) -> NodeState {
        node.update(&mut TickContext {
            delta_time: dt,
            blackboard,
        })
    }

    #[test]
    fn test_wait_accumulates_delta_time() {
        let mut blackboard = Blackboard::new();
        let mut node = BtNode::new(Wait::new(1.0));
        assert_eq!(tick(&mut node, &mut blackboard, 0.4), NodeState::Running);
        assert_eq!(tick(&mut node, &mut blackboard, 0.4), NodeState::Running);
        assert_eq!(tick(&mut node, &mut blackboard, 0.4), NodeState::Success);
        // Elapsed restarts for the next episode
        assert_eq!(tick(&mut node, &mut blackboard, 0.4), NodeState::Running);
    }

    #[test]
    fn test_zero_wait_succeeds_immediately() {
        let mut blackboard = Blackboard::new();
        let mut node = BtNode::new(Wait::new(0.0));
        assert_eq!(tick(&mut node, &mut blackboard, 0.0), NodeState::Success);
    }

    #[test]
    fn test_flags_round_trip_through_blackboard() {
        let mut blackboard = Blackboard::new();
        let mut check = BtNode::new(CheckFlag::new("alert"));
        let mut set = BtNode::new(SetFlag::new("alert", true));

        assert_eq!(tick(&mut check, &mut blackboard, 0.0), NodeState::Failure);
        assert_eq!(tick(&mut set, &mut blackboard, 0.0), NodeState::Success);
        assert_eq!(tick(&mut check, &mut blackboard, 0.0), NodeState::Success);
    }

    #[test]
    fn test_fn_action_sees_context() {
        let mut blackboard = Blackboard::new();
        blackboard.set("ammo", 2_u32);
        let mut node = BtNode::new(FnAction::new("Shoot", |ctx: &mut TickContext| {
            match ctx.blackboard.get_mut::<u32>("ammo") {
                Ok(ammo) if *ammo > 0 => {
                    *ammo -= 1;
                    NodeState::Success
                }
                _ => NodeState::Failure,
            }
        }));

        assert_eq!(tick(&mut node, &mut blackboard, 0.0), NodeState::Success);
        assert_eq!(tick(&mut node, &mut blackboard, 0.0), NodeState::Success);
        assert_eq!(tick(&mut node, &mut blackboard, 0.0), NodeState::Failure);
        assert_eq!(node.name(), "Shoot");
    }
}
