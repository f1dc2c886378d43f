use super::*;

impl GameEngine {
    /// Puts the player and every ghost back on their spawn cells.
    ///
    /// Actors are repositioned rather than rebuilt, so each ghost keeps its
    /// own random stream across lives and levels.
    pub(super) fn reset_actor_positions(&mut self) {
        let (x, y) = self.player_spawn;
        self.player.set_position(x, y);
        for ghost in &mut self.ghosts {
            ghost.reset();
        }
    }

    pub(super) fn reset_level(&mut self, keep_score: bool) {
        self.level = self.template.clone();
        self.reset_actor_positions();
        self.power_timer = 0;
        if !keep_score {
            self.score = 0;
            self.lives = self.config.session.start_lives;
        }
        self.ready_timer = self.config.session.ready_delay_ticks;
        self.set_phase(GamePhase::Ready);
    }
}
