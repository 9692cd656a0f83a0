//! XML document shape for template files.
//!
//! Wire format:
//!
//! ```xml
//! <Templates>
//!   <Template>
//!     <name>user.byEmail</name>
//!     <template>SELECT * FROM user_account WHERE email = :email</template>
//!   </Template>
//! </Templates>
//! ```

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TemplatesDoc {
    #[serde(rename = "Template", default)]
    pub templates: Vec<TemplateNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateNode {
    pub name: String,
    pub template: String,
}

pub(crate) fn parse_document(text: &str) -> Result<TemplatesDoc, quick_xml::DeError> {
    quick_xml::de::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::parse_document;

    #[test]
    fn parses_multiple_templates() {
        let doc = parse_document(
            "<Templates>\
               <Template><name>a</name><template>SELECT 1</template></Template>\
               <Template><name>b</name><template>SELECT 2</template></Template>\
             </Templates>",
        )
        .unwrap();
        assert_eq!(doc.templates.len(), 2);
        assert_eq!(doc.templates[0].name, "a");
        assert_eq!(doc.templates[1].template, "SELECT 2");
    }

    #[test]
    fn empty_document_yields_no_templates() {
        let doc = parse_document("<Templates></Templates>").unwrap();
        assert!(doc.templates.is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_document("<Templates><Template></Templates>").is_err());
    }
}
