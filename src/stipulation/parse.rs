//! Textual stipulations.
//!
//! ```text
//! stip  := "quod(" stip "," stip ")" | "reci(" stip "," stip ")" | ["h" | "s" | "r"] goals moves
//! goals := goal | "(" expr ")" | "!" goals
//! expr  := term ("|" term)*
//! term  := factor ("&" factor)*
//! moves := digits [".5"]
//! ```
//! Goals: `#` mate, `=` stalemate, `+` check, `x` capture.

use crate::problem::SolveError;
use crate::stipulation::goal::{Goal, GoalExpr};
use crate::stipulation::Stipulation;

pub fn parse_stipulation(input: &str) -> Result<Stipulation, SolveError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let mut p = Parser {
        input,
        chars: compact.chars().collect(),
        pos: 0,
    };
    let stip = p.stipulation()?;
    if p.pos != p.chars.len() {
        return Err(p.error("trailing characters"));
    }
    Ok(stip)
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> SolveError {
        SolveError::StipulationParse {
            input: self.input.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SolveError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {c:?}")))
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        let n = kw.chars().count();
        if self.chars.len() >= self.pos + n && self.chars[self.pos..self.pos + n].iter().copied().eq(kw.chars()) {
            self.pos += n;
            true
        } else {
            false
        }
    }

    fn stipulation(&mut self) -> Result<Stipulation, SolveError> {
        for (kw, reciprocal) in [("quod(", false), ("reci(", true)] {
            if self.eat_keyword(kw) {
                let a = self.stipulation()?;
                self.expect(',')?;
                let b = self.stipulation()?;
                self.expect(')')?;
                return Ok(if reciprocal {
                    Stipulation::Reciprocal(Box::new(a), Box::new(b))
                } else {
                    Stipulation::Quodlibet(Box::new(a), Box::new(b))
                });
            }
        }
        let play = match self.peek() {
            Some(c @ ('h' | 's' | 'r')) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        };
        let goal = self.goals()?;
        let (moves, half) = self.moves()?;
        if play == Some('h') {
            let half_moves = 2 * moves + u32::from(half);
            if half_moves == 0 {
                return Err(self.error("help play needs at least one half-move"));
            }
            return Ok(Stipulation::Help { goal, half_moves });
        }
        if half || moves == 0 {
            return Err(self.error("battle play needs a whole number of moves"));
        }
        Ok(match play {
            Some('s') => Stipulation::SelfPlay { goal, moves },
            Some('r') => Stipulation::Reflex { goal, moves },
            _ => Stipulation::Direct { goal, moves },
        })
    }

    fn goals(&mut self) -> Result<GoalExpr, SolveError> {
        if self.eat('!') {
            return Ok(GoalExpr::Not(Box::new(self.goals()?)));
        }
        if self.eat('(') {
            let e = self.expr()?;
            self.expect(')')?;
            return Ok(e);
        }
        match self.peek().and_then(Goal::from_symbol) {
            Some(g) => {
                self.pos += 1;
                Ok(GoalExpr::Goal(g))
            }
            None => Err(self.error("expected a goal")),
        }
    }

    fn expr(&mut self) -> Result<GoalExpr, SolveError> {
        let mut left = self.term()?;
        while self.eat('|') {
            let right = self.term()?;
            left = GoalExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<GoalExpr, SolveError> {
        let mut left = self.goals()?;
        while self.eat('&') {
            let right = self.goals()?;
            left = GoalExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn moves(&mut self) -> Result<(u32, bool), SolveError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a number of moves"));
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let moves = digits.parse().map_err(|_| self.error("number too large"))?;
        let half = self.eat_keyword(".5");
        Ok((moves, half))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direct_help_and_combinations() {
        let s = parse_stipulation("#2").unwrap();
        assert_eq!(s.half_moves(), 3);
        let s = parse_stipulation("h=1.5").unwrap();
        assert_eq!(s.half_moves(), 3);
        assert_eq!(s.to_string(), "h=1.5");
        let s = parse_stipulation("h(#|=)2").unwrap();
        assert_eq!(s.to_string(), "h(#|=)2");
        let s = parse_stipulation("quod(#1, =1)").unwrap();
        assert!(matches!(s, Stipulation::Quodlibet(..)));
        assert_eq!(s.to_string(), "quod(#1,=1)");
        let s = parse_stipulation("s#2").unwrap();
        assert!(matches!(s, Stipulation::SelfPlay { moves: 2, .. }));
        assert_eq!(s.half_moves(), 4);
        assert_eq!(s.to_string(), "s#2");
        let s = parse_stipulation("r=1").unwrap();
        assert!(matches!(s, Stipulation::Reflex { moves: 1, .. }));
        assert_eq!(s.to_string(), "r=1");
    }

    #[test]
    fn rejects_malformed_input() {
        let inputs = [
            "", "#", "h#0", "#1.5", "#2x", "q(#1,#1)", "(#&)1", "s#0", "r#1.5", "z2", "hep1", "h##1",
        ];
        for bad in inputs {
            assert!(
                matches!(parse_stipulation(bad), Err(SolveError::StipulationParse { .. })),
                "{bad:?}"
            );
        }
    }
}
