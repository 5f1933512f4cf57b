/// Either a node or a token. Used for green slots, red children and list
/// elements alike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    pub fn into_node(self) -> Option<N> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<T> {
        match self {
            Self::Token(token) => Some(token),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&N> {
        self.as_ref().into_node()
    }

    pub fn as_token(&self) -> Option<&T> {
        self.as_ref().into_token()
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    pub fn as_ref(&self) -> NodeOrToken<&N, &T> {
        match self {
            Self::Node(node) => NodeOrToken::Node(node),
            Self::Token(token) => NodeOrToken::Token(token),
        }
    }

    /// Applies the matching function and merges the result.
    pub fn either<R>(self, node: impl FnOnce(N) -> R, token: impl FnOnce(T) -> R) -> R {
        match self {
            Self::Node(it) => node(it),
            Self::Token(it) => token(it),
        }
    }
}
