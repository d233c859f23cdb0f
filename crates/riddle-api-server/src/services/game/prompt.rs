use std::collections::HashSet;

/// Canonical player utterance that opens a game and asks the host for a
/// fresh riddle.
pub const START_TOKEN: &str = "开始";

/// Marker the host emits inside a completion when the game is over; its
/// presence triggers session eviction.
pub const GAME_OVER_MARKER: &str = "游戏结束";

/// Parameters for rendering the host system prompt. Kept structured so the
/// contract is testable independent of the wording.
#[derive(Debug, Clone)]
pub struct HostPromptParams<'a> {
    /// Riddles already generated in this room; the host must not repeat them.
    pub asked_riddles: &'a HashSet<String>,
    /// Question budget after which the host must end the game.
    pub max_questions: u32,
}

/// Render the full host-persona system prompt, embedding the current
/// asked-riddle list into the anti-repetition rule block.
pub fn render_host_prompt(params: &HostPromptParams<'_>) -> String {
    let mut riddles: Vec<&str> = params.asked_riddles.iter().map(String::as_str).collect();
    riddles.sort_unstable();
    let history = riddles.join("\n");

    format!(
        "你是一位脑筋急转弯游戏主持人，我们将进行一个“是非问答”推理游戏。\n\
        \n\
        【题目生成规则】\n\
        1. 当玩家第一次说“{start}”时，你必须立即生成一个全新的、从未在任何对话中出现过的脑筋急转弯推理题。\n\
        2. 题目必须具有独特的背景、场景和细节，不得使用网络高频模板。\n\
        3. 每次出题必须随机选择题材（悬疑、搞笑、生活、校园、科幻等）、随机角色、随机事件。\n\
        4. 不得与历史题目重复。（历史题目列表：\n\
        {history}\n\
        ）\n\
        5. 出题后，你只能回答：是 / 否 / 与此无关。\n\
        \n\
        【答题规则】\n\
        玩家提问后，你只能回答上述三种之一；必要时可以适度引导。\n\
        \n\
        【游戏结束规则】\n\
        玩家输入“退出”“揭晓答案”“告诉我答案”等；\n\
        或玩家推理正确；\n\
        或玩家问满 {max_questions} 个问题。\n\
        游戏结束时，你必须输出“{game_over}”并给出完整解释（汤底）。\n\
        \n\
        【注意】\n\
        玩家第一次说“{start}”时，你必须创建新题目，而不是回答是/否。\n\
        题目必须新鲜、有创意，严禁重复。\n\
        游戏流程：{start} → 出题 → 问答 → 结束。",
        start = START_TOKEN,
        history = history,
        max_questions = params.max_questions,
        game_over = GAME_OVER_MARKER,
    )
}
