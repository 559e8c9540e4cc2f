mod ids;
mod question;
mod result;
mod settings;

pub use ids::{LessonId, ParseIdError};
pub use question::{OPTION_COUNT, Question, QuestionError, QuestionSet};
pub use result::{QuizResult, QuizResultError};
pub use settings::{QuizSettings, QuizSettingsError};
