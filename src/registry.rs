//! Games available to the UI layer, looked up by name

use crate::error::GameError;
use crate::game::Game;

#[derive(Default)]
pub struct GameRegistry {
    games: Vec<Box<dyn Game>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game; a game with the same name is replaced
    pub fn register(&mut self, game: Box<dyn Game>) {
        log::info!("Registered game `{}` ({} levels)", game.name(), game.level_count());
        match self.games.iter_mut().find(|g| g.name() == game.name()) {
            Some(slot) => *slot = game,
            None => self.games.push(game),
        }
    }

    pub fn game(&self, name: &str) -> Result<&dyn Game, GameError> {
        self.games
            .iter()
            .find(|g| g.name() == name)
            .map(|g| &**g)
            .ok_or_else(|| GameError::UnknownGame(name.to_string()))
    }

    pub fn game_mut(&mut self, name: &str) -> Result<&mut (dyn Game + 'static), GameError> {
        match self.games.iter_mut().find(|g| g.name() == name) {
            Some(game) => Ok(&mut **game),
            None => Err(GameError::UnknownGame(name.to_string())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.games.iter().map(|g| g.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DirectionsGame, GameManifest};
    use crate::persistence::MemoryStore;
    use crate::platform::MemoryAssets;

    fn game(name: &str, levels: usize) -> Box<dyn Game> {
        let levels = (0..levels).map(|i| format!(r#"{{"asset":"l{i}.png"}}"#)).collect::<Vec<_>>();
        let json = format!(r#"{{"name":"{name}","levels":[{}]}}"#, levels.join(","));
        let manifest = GameManifest::from_json(&json).unwrap();
        Box::new(DirectionsGame::new(
            manifest,
            Box::new(MemoryAssets::new()),
            Box::new(MemoryStore::new()),
        ))
    }

    #[test]
    fn test_lookup() {
        let mut registry = GameRegistry::new();
        registry.register(game("Directions", 3));
        assert_eq!(registry.game("Directions").unwrap().level_count(), 3);
        assert!(matches!(
            registry.game("Pong"),
            Err(GameError::UnknownGame(name)) if name == "Pong"
        ));

        let g = registry.game_mut("Directions").unwrap();
        assert!(g.load().is_ok());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = GameRegistry::new();
        registry.register(game("Directions", 3));
        registry.register(game("Directions", 5));
        registry.register(game("Other", 1));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Directions", "Other"]);
        assert_eq!(registry.game("Directions").unwrap().level_count(), 5);
    }
}
