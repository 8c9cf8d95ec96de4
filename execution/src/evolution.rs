use clickfarm_types::factory::{EvolutionMode, Factory, ToolHolding};

/// Rebases a factory's holdings when it advances an evolution tier.
pub trait EvolutionPolicy {
    fn rebase(&self, factory: &mut Factory);
}

/// Holdings survive untouched.
pub struct Keep;

/// Every owned amount is halved, rounding down. Levels survive.
pub struct Halve;

/// Holdings and levels are cleared. Power, spend and earnings survive.
pub struct Reset;

impl EvolutionPolicy for Keep {
    fn rebase(&self, _: &mut Factory) {}
}

impl EvolutionPolicy for Halve {
    fn rebase(&self, factory: &mut Factory) {
        for holding in factory.tools.iter_mut() {
            holding.amount /= 2;
        }
    }
}

impl EvolutionPolicy for Reset {
    fn rebase(&self, factory: &mut Factory) {
        factory.tools.iter_mut().for_each(|holding| *holding = ToolHolding::default());
    }
}

pub fn policy(mode: EvolutionMode) -> &'static dyn EvolutionPolicy {
    match mode {
        EvolutionMode::Keep => &Keep,
        EvolutionMode::Halve => &Halve,
        EvolutionMode::Reset => &Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> Factory {
        let mut factory = Factory::new(0);
        *factory.holding_mut(0) = ToolHolding { amount: 7, level: 2 };
        *factory.holding_mut(1) = ToolHolding { amount: 1, level: 0 };
        factory.power = 3;
        factory
    }

    #[test]
    fn test_keep() {
        let mut evolved = factory();
        policy(EvolutionMode::Keep).rebase(&mut evolved);
        assert_eq!(evolved, factory());
    }

    #[test]
    fn test_halve_rounds_down() {
        let mut evolved = factory();
        policy(EvolutionMode::Halve).rebase(&mut evolved);
        assert_eq!(evolved.holding(0), ToolHolding { amount: 3, level: 2 });
        assert_eq!(evolved.holding(1).amount, 0);
        assert_eq!(evolved.power, 3);
    }

    #[test]
    fn test_reset() {
        let mut evolved = factory();
        policy(EvolutionMode::Reset).rebase(&mut evolved);
        assert_eq!(evolved.units(), 0);
        assert_eq!(evolved.holding(0).level, 0);
        assert_eq!(evolved.power, 3);
    }
}
