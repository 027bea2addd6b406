/// Ordered route guesses for one logical gateway operation. The first path
/// that does not answer 404 wins, so the most likely route goes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointCandidates {
    pub operation: &'static str,
    pub paths: &'static [&'static str],
}

pub const WIKIPEDIA_QUERY: EndpointCandidates = EndpointCandidates {
    operation: "Wikipedia chatbot",
    paths: &[
        "/chatbots/wikipedia/query",
        "/chatbot/wikipedia/query",
        "/chatbots/wikipedia",
        "/chatbot/wikipedia",
        "/wikipedia/query",
    ],
};

pub const PROGRAMMING_QUERY: EndpointCandidates = EndpointCandidates {
    operation: "Programming chatbot",
    paths: &[
        "/chatbots/programming/chat",
        "/chatbots/programming/query",
        "/chatbot/programming/query",
        "/chatbots/progra/query",
        "/chatbotprogra/query",
        "/programming/query",
        "/chatbots/prog/query",
    ],
};
