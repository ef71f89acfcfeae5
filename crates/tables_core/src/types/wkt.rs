//! Structural check for Well-Known Text geometries.

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number,
    Open,
    Close,
    Comma,
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(&c) = chars.peek().filter(|c| c.is_ascii_alphabetic()) {
                    word.push(c.to_ascii_uppercase());
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut number = String::new();
                while let Some(&c) = chars
                    .peek()
                    .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
                {
                    number.push(c);
                    chars.next();
                }
                number.parse::<f64>().ok()?;
                tokens.push(Token::Number);
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn geometry(&mut self) -> bool {
        let Some(Token::Word(kind)) = self.peek().cloned() else {
            return false;
        };
        self.pos += 1;
        if let Some(Token::Word(dim)) = self.peek() {
            if matches!(dim.as_str(), "Z" | "M" | "ZM") {
                self.pos += 1;
            }
        }
        if let Some(Token::Word(word)) = self.peek() {
            if word == "EMPTY" {
                self.pos += 1;
                return true;
            }
        }
        match kind.as_str() {
            "POINT" => self.wrapped(Self::coordinate),
            "LINESTRING" => self.wrapped(|p| p.list(Self::coordinate)),
            "POLYGON" => self.wrapped(|p| p.list(|p| p.wrapped(|p| p.list(Self::coordinate)))),
            "MULTIPOINT" => self.wrapped(|p| p.list(|p| p.wrapped(Self::coordinate) || p.coordinate())),
            "MULTILINESTRING" => self.wrapped(|p| p.list(|p| p.wrapped(|p| p.list(Self::coordinate)))),
            "MULTIPOLYGON" => self.wrapped(|p| {
                p.list(|p| p.wrapped(|p| p.list(|p| p.wrapped(|p| p.list(Self::coordinate)))))
            }),
            "GEOMETRYCOLLECTION" => self.wrapped(|p| p.list(Self::geometry)),
            _ => false,
        }
    }

    fn wrapped(&mut self, inner: impl FnOnce(&mut Self) -> bool) -> bool {
        self.eat(&Token::Open) && inner(self) && self.eat(&Token::Close)
    }

    fn list(&mut self, mut item: impl FnMut(&mut Self) -> bool) -> bool {
        if !item(self) {
            return false;
        }
        while self.eat(&Token::Comma) {
            if !item(self) {
                return false;
            }
        }
        true
    }

    fn coordinate(&mut self) -> bool {
        let mut count = 0;
        while self.eat(&Token::Number) {
            count += 1;
        }
        (2..=4).contains(&count)
    }
}

/// Whether the text is a syntactically valid WKT geometry.
pub(crate) fn is_valid(text: &str) -> bool {
    let Some(tokens) = tokenize(text) else {
        return false;
    };
    let mut parser = Parser { tokens, pos: 0 };
    parser.geometry() && parser.pos == parser.tokens.len()
}
