//! Prompt text sent to the vision and chat models.

/// Yes/no importance question. The answer is searched for "important".
pub(crate) const SIMPLE_CLASSIFICATION_PROMPT: &str = "\
Look at this image extracted from an educational PDF document.
Is it IMPORTANT educational content (a diagram, chart, technical illustration, \
photo demonstrating a procedure, equipment or concept) or DECORATIVE \
(a logo, icon, border, background, stock filler or page ornament)?
Reply with exactly one word: important or decorative.";

/// Detailed classification request answered with JSON.
pub(crate) fn enhanced_classification_prompt(context: &str) -> String {
    let context_line = if context.trim().is_empty() {
        String::new()
    } else {
        format!("The image appears in the section: \"{}\".\n", context.trim())
    };

    format!(
        "Analyze this image extracted from an educational PDF document.\n\
         {context_line}\
         Decide whether it carries educational value for a learner, and describe it.\n\
         \n\
         Respond with JSON only, in this exact shape:\n\
         {{\n\
         \x20 \"is_important\": true or false,\n\
         \x20 \"image_type\": \"diagram\" | \"chart\" | \"photo\" | \"illustration\" | \"table\" | \"screenshot\" | \"logo\" | \"icon\" | \"decorative\" | \"other\",\n\
         \x20 \"description\": \"one or two sentences describing what the image shows\",\n\
         \x20 \"relevance_score\": 0-10,\n\
         \x20 \"tags\": [\"up to 5 short keywords\"]\n\
         }}\n\
         \n\
         Logos, icons, borders and purely decorative images are not important."
    )
}

/// System message for heading identification.
pub(crate) const HEADING_SYSTEM_PROMPT: &str = "You are an expert at analyzing document structure and identifying section headings. Return only valid JSON.";

/// Heading identification request over a page-marked document.
pub(crate) fn heading_prompt(document: &str) -> String {
    format!(
        "Below is the text of a document. Each page starts with a marker line \
         such as \"=== PAGE 3 ===\".\n\
         \n\
         Identify the main section headings of the document (chapters, units, \
         modules and numbered sections). Ignore running headers, footers, page \
         numbers, the table of contents and front matter.\n\
         \n\
         Return a JSON array where each element is:\n\
         {{\"heading\": \"exact heading text\", \"level\": 1 or 2, \
         \"start_page\": page number where the section starts, \
         \"context\": \"short summary of the section\"}}\n\
         \n\
         List the headings in document order.\n\
         \n\
         DOCUMENT:\n{document}"
    )
}
