//! Default prompt templates.

/// Question-answering prompt. `{context}` and `{question}` are substituted.
pub const DEFAULT_QA_PROMPT: &str = r#"You are a helpful assistant answering questions based on the given context.

IMPORTANT: 
- Use ONLY the information from the context below
- Be specific and cite information accurately
- If you cannot answer based on the context, say "I cannot find this information in the document"
- When mentioning statistics or specific facts, try to indicate which part of the context they come from

Context:
{context}

Question: {question}

Answer (be specific and accurate):"#;
