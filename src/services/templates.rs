//! Canonical stage scripts, questions, and deterministic messages.
//!
//! Three consumers share this table:
//! - the talker, as prompt material for stage-entry rendering and as canned
//!   fallbacks when the render call fails;
//! - the safety net, which matches the last rendered coach message against
//!   each stage's canonical question markers to detect stage/question drift;
//! - the reasoner, which embeds the current stage's goal into the extraction
//!   prompt.
//!
//! Deterministic messages (clarification, redirects, fallbacks) bypass the
//! model entirely, so they ship in English and Russian; everything the model
//! renders is language-steered through the prompt instead.

use crate::domain::models::Stage;

/// True when the language tag selects the Russian deterministic variants.
fn is_russian(language: &str) -> bool {
    let tag = language.trim().to_lowercase();
    tag == "ru" || tag.starts_with("ru-") || tag == "russian"
}

/// Full stage-entry script: what the stage is for and its opening question.
///
/// Rendered verbatim as the canned fallback and handed to the model as the
/// basis of the stage-entry message.
pub fn entry_script(stage: Stage) -> &'static str {
    match stage {
        Stage::Contract => {
            "Before we start: this is a structured self-reflection process. \
             We will move step by step from a topic that matters to you, through \
             a concrete situation and what happened inside you there, to a choice \
             and a first step. I will ask questions; you stay in charge of the \
             answers. Shall we begin?"
        }
        Stage::Topic => {
            "Let's find your topic. What would you like to work on today? \
             Pick something that keeps coming back and costs you energy."
        }
        Stage::Event => {
            "Now let's ground the topic in a concrete situation. Recall a recent, \
             specific moment where this showed up: you were actively involved, it \
             stirred something in you, and at least one other person was there. \
             What happened?"
        }
        Stage::Emotions => {
            "Let's look at what that moment felt like from the inside. \
             What emotions did you feel right then? Try to name several distinct ones."
        }
        Stage::Thought => {
            "Behind emotions there is usually a thought. What flashed through \
             your mind in that moment, word for word if you can?"
        }
        Stage::Action => {
            "Now the behavior. What did you actually do in that moment? \
             And what did you want to do instead?"
        }
        Stage::Gap => {
            "There is a gap between what you did and what you wanted to do. \
             How would you name that gap? And how wide is it for you, from 0 to 10?"
        }
        Stage::Pattern => {
            "Let's check whether this is bigger than one situation. Does this way \
             of reacting repeat elsewhere in your life? How would you describe \
             the pattern?"
        }
        Stage::GainsLosses => {
            "Every pattern survives because it pays. What does this pattern give \
             you? And what does it cost you?"
        }
        Stage::ValuesAbilities => {
            "Now the resources for change. What values of yours would acting \
             differently serve? And what abilities do you already have that \
             would help?"
        }
        Stage::Choice => {
            "You have seen the gains, the losses, and your values. \
             Knowing all of that - what do you choose?"
        }
        Stage::Vision => {
            "Imagine your life some time from now, where you act the new way. \
             What does it look like? What is different?"
        }
        Stage::Commitment => {
            "Let's make it real. What is one concrete step you commit to, \
             and by when?"
        }
        Stage::Complete => {
            "We have walked the full circle: from topic to a concrete situation, \
             through what you felt, thought and did, to a pattern, a choice and \
             a commitment. Thank you for your openness. The commitment you made \
             is yours to carry now."
        }
    }
}

/// Distinctive question markers per stage, normalized-containment matched
/// against rendered coach messages to detect a question that belongs to a
/// different stage than the declared one.
pub fn question_markers(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Contract => &["shall we begin", "do you agree to try"],
        Stage::Topic => &["what would you like to work on", "pick something that keeps coming back"],
        Stage::Event => &["recall a recent", "ground the topic in a concrete situation"],
        Stage::Emotions => &["what emotions did you feel", "name several distinct"],
        Stage::Thought => &["what flashed through your mind", "behind emotions there is usually a thought"],
        Stage::Action => &["what did you actually do", "want to do instead"],
        Stage::Gap => &["how would you name that gap", "from 0 to 10"],
        Stage::Pattern => &["does this way of reacting repeat", "describe the pattern"],
        Stage::GainsLosses => &["what does this pattern give", "what does it cost"],
        Stage::ValuesAbilities => &["what values of yours", "what abilities do you already have"],
        Stage::Choice => &["what do you choose"],
        Stage::Vision => &["imagine your life", "what does it look like"],
        Stage::Commitment => &["one concrete step you commit", "by when"],
        Stage::Complete => &["walked the full circle"],
    }
}

/// Fixed clarification answer for "what is this / what do you mean" at the
/// contract stage. Deterministic: zero latency, zero model cost.
pub fn clarify_message(language: &str) -> &'static str {
    if is_russian(language) {
        "Это структурированная практика саморефлексии: шаг за шагом мы пройдём \
         от темы, которая вас волнует, через конкретную ситуацию, чувства и \
         мысли, к осознанному выбору и первому шагу. Я задаю вопросы, вы \
         отвечаете в своём темпе. Согласны попробовать?"
    } else {
        "This is a structured self-reflection practice: step by step we move \
         from a topic that matters to you, through one concrete situation and \
         what you felt and thought there, to a conscious choice and a first \
         step. I ask the questions; you answer at your own pace. Would you \
         like to try?"
    }
}

/// Deterministic redirect when the model tried to skip ahead: points at the
/// question of the stage that must come first.
pub fn redirect_message(stage: Stage, language: &str) -> String {
    if is_russian(language) {
        format!(
            "Давайте не будем забегать вперёд - сначала важно закончить текущий шаг. {}",
            entry_script(stage)
        )
    } else {
        format!(
            "Let's not jump ahead - this step matters before the next one. {}",
            entry_script(stage)
        )
    }
}

/// Canned short follow-up for a loop turn when the render call fails.
pub fn loop_fallback(language: &str, hints: &[String]) -> String {
    let lead = if is_russian(language) {
        "Прежде чем идти дальше, мне не хватает ещё немного: "
    } else {
        "Before we move on, I still need a little more: "
    };
    if hints.is_empty() {
        let tail = if is_russian(language) {
            "расскажите, пожалуйста, чуть подробнее."
        } else {
            "could you tell me a bit more?"
        };
        return format!("{lead}{tail}");
    }
    format!("{lead}{}.", hints.join("; "))
}
